//! Support for creating Atom feeds from a list of posts.

use crate::config::Author;
use crate::content::Record;
use atom_syndication::{
    Category as AtomCategory, Entry, Error as AtomError, Feed, FixedDateTime, Link, Person, Text,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,

    /// The feed's own URL, advertised as its `self` link.
    pub feed_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// posts (most recent first) and writes the result to a [`std::io::Write`].
/// This function takes ownership of the provided [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[&Record], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, posts: &[&Record]) -> Feed {
    let now = Utc::now().fixed_offset();
    let mut feed = Feed::default();
    feed.set_entries(feed_entries(&config, posts, now));
    feed.set_title(config.title);
    feed.set_id(config.id);
    // the most recent post, since `posts` is most recent first
    feed.set_updated(posts.iter().find_map(|p| p.date()).map_or(now, midnight));
    feed.set_authors(author_to_people(config.author.as_ref()));
    feed.set_links(vec![
        link(&config.home_page, "alternate"),
        link(&config.feed_url, "self"),
    ]);
    feed
}

fn feed_entries(config: &FeedConfig, posts: &[&Record], now: FixedDateTime) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::with_capacity(posts.len());

    for post in posts {
        let (summary, _) = post.summary();
        let date = post.date().map_or(now, midnight);

        let mut entry = Entry::default();
        entry.set_id(post.url.to_string());
        entry.set_title(post.title.clone());
        entry.set_updated(date);
        entry.set_published(Some(date));
        entry.set_authors(author_to_people(config.author.as_ref()));
        entry.set_links(vec![link(&post.url, "alternate")]);
        entry.set_summary(Some(Text::html(summary.to_owned())));
        entry.set_categories(
            post.categories
                .iter()
                .map(|c| {
                    let mut category = AtomCategory::default();
                    category.set_term(c.slug.clone());
                    category.set_label(Some(c.name.clone()));
                    category
                })
                .collect::<Vec<_>>(),
        );
        entries.push(entry);
    }
    entries
}

/// Dates are published at midnight UTC.
fn midnight(date: NaiveDate) -> FixedDateTime {
    date.and_time(NaiveTime::default()).and_utc().fixed_offset()
}

fn link(href: &Url, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href.to_string());
    link.set_rel(rel);
    link
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name.clone());
            person.set_email(author.email.clone());
            vec![person]
        }
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include I/O and Atom
/// issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use std::path::Path;

    #[test]
    fn test_write_feed() -> Result<()> {
        let site_root = Url::parse("https://example.org/").unwrap();
        let categories_url = site_root.join("categories/").unwrap();
        let parser = Parser::new(&site_root, &categories_url);
        let posts = vec![
            parser
                .parse_str(
                    Path::new("posts/second.md"),
                    "+++\ntitle = \"Second\"\ndate = 2021-06-01\n\
                     [taxonomies]\ncategories = [\"Rust Tips\"]\n+++\n\
                     Above.\n\n<!-- more -->\n\nBelow.",
                )
                .unwrap(),
            parser
                .parse_str(
                    Path::new("posts/first.md"),
                    "+++\ntitle = \"First\"\ndate = 2021-01-01\n+++\nHello.",
                )
                .unwrap(),
        ];
        let refs: Vec<&Record> = posts.iter().collect();

        let mut out = Vec::new();
        write_feed(
            FeedConfig {
                title: "Test Blog".to_owned(),
                id: site_root.to_string(),
                author: Some(Author {
                    name: "Jane".to_owned(),
                    email: None,
                }),
                home_page: site_root.clone(),
                feed_url: site_root.join("feed.atom").unwrap(),
            },
            &refs,
            &mut out,
        )?;

        let feed = Feed::read_from(&out[..])?;
        assert_eq!("Test Blog", feed.title().value);
        assert_eq!("2021-06-01T00:00:00+00:00", feed.updated().to_rfc3339());
        assert_eq!(2, feed.entries().len());

        let entry = &feed.entries()[0];
        assert_eq!("Second", entry.title().value);
        assert_eq!("https://example.org/posts/second.html", entry.id());
        assert_eq!("Jane", entry.authors()[0].name());
        assert_eq!("rust-tips", entry.categories()[0].term());
        let summary = entry.summary().map(|s| s.value.as_str()).unwrap_or_default();
        assert!(summary.contains("Above."), "{}", summary);
        assert!(!summary.contains("Below."), "{}", summary);
        Ok(())
    }
}
