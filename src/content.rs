//! Defines the [`Record`] type, the in-memory form of one content file, and
//! its conversions into template values.

use crate::category::Category;
use crate::frontmatter::FrontMatter;
use chrono::NaiveDate;
use gtmpl::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// The directory (relative to the content directory) whose files are blog
/// posts. Everything else is a static page.
pub const POSTS_DIRECTORY: &str = "posts";

/// Whether a record is a dated blog post or a static page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// A blog post. Posts are listed on index pages, category pages and in
    /// the feed.
    Post,

    /// A static page, e.g. an "about" page. Pages are listed in the site
    /// navigation only.
    Page,
}

impl Kind {
    /// The template used for records of this kind when their front matter
    /// doesn't name one.
    pub fn default_template(self) -> &'static str {
        match self {
            Kind::Post => "post.html",
            Kind::Page => "page.html",
        }
    }
}

/// A parsed content file: its front matter, its rendered body, and where it
/// will be published.
#[derive(Clone, Debug)]
pub struct Record {
    /// The path of the source file relative to the content directory, minus
    /// the extension and using `/` separators (e.g. `posts/hello`).
    pub id: String,

    pub kind: Kind,

    /// The title from front matter, or the file stem if there isn't one.
    pub title: String,

    /// The recognized front matter keys.
    pub front_matter: FrontMatter,

    /// The whole front matter mapping, including unrecognized keys.
    pub extra: toml::Table,

    /// The categories from front matter, in order, without duplicates.
    pub categories: Vec<Category>,

    /// The rendered HTML body.
    pub body: String,

    /// The URL at which the record will be published.
    pub url: Url,

    /// The output file path, relative to the output directory.
    pub file_path: PathBuf,
}

impl Record {
    pub fn date(&self) -> Option<NaiveDate> {
        self.front_matter.date
    }

    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }

    /// The name of the theme template this record renders with.
    pub fn template_name(&self) -> &str {
        self.front_matter
            .template_page
            .as_deref()
            .unwrap_or_else(|| self.kind.default_template())
    }

    /// Returns the part of the body above the `<!-- more -->` fold, and
    /// whether anything was left out.
    pub fn summary(&self) -> (&str, bool) {
        crate::markdown::summarize(&self.body)
    }

    /// Converts the record into a [`Value`] for the record's own page. The
    /// result has the full `body`.
    pub fn to_value(&self) -> Value {
        let mut m = self.common_fields();
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Converts the record into a [`Value`] for index pages. In place of the
    /// body it has `summary` and `summarized`.
    pub fn summarize(&self) -> Value {
        let (summary, summarized) = self.summary();
        let mut m = self.common_fields();
        m.insert("summary".to_owned(), Value::String(summary.to_owned()));
        m.insert("summarized".to_owned(), Value::Bool(summarized));
        Value::Object(m)
    }

    /// A `{title, url}` pair, used for navigation lists.
    pub fn to_link(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        Value::Object(m)
    }

    fn common_fields(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::String(self.id.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert(
            "description".to_owned(),
            match &self.front_matter.description {
                Some(description) => Value::String(description.clone()),
                None => Value::Nil,
            },
        );
        m.insert(
            "date".to_owned(),
            match self.date() {
                Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
                None => Value::Nil,
            },
        );
        m.insert("draft".to_owned(), Value::Bool(self.is_draft()));
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert(
            "categories".to_owned(),
            Value::Array(self.categories.iter().map(Value::from).collect()),
        );
        m
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(body: &str) -> Record {
        let categories_url = Url::parse("https://example.org/categories/").unwrap();
        Record {
            id: "posts/hello".to_owned(),
            kind: Kind::Post,
            title: "Hello".to_owned(),
            front_matter: FrontMatter {
                title: Some("Hello".to_owned()),
                date: NaiveDate::from_ymd_opt(2021, 4, 16),
                ..FrontMatter::default()
            },
            extra: toml::Table::new(),
            categories: vec![Category::new("Rust", &categories_url).unwrap()],
            body: body.to_owned(),
            url: Url::parse("https://example.org/posts/hello.html").unwrap(),
            file_path: PathBuf::from("posts/hello.html"),
        }
    }

    fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
        match value {
            Value::Object(m) => &m[key],
            _ => panic!("wanted an object"),
        }
    }

    fn string(value: &Value) -> Option<&str> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[test]
    fn test_template_name() {
        let mut r = record("");
        assert_eq!("post.html", r.template_name());
        r.kind = Kind::Page;
        assert_eq!("page.html", r.template_name());
        r.front_matter.template_page = Some("about.html".to_owned());
        assert_eq!("about.html", r.template_name());
    }

    #[test]
    fn test_to_value() {
        let value = record("<p>Body</p>\n").to_value();
        assert_eq!(Some("Hello"), string(field(&value, "title")));
        assert_eq!(Some("2021-04-16"), string(field(&value, "date")));
        assert!(matches!(field(&value, "description"), Value::Nil));
        assert_eq!(Some("<p>Body</p>\n"), string(field(&value, "body")));
        match field(&value, "categories") {
            Value::Array(categories) => {
                assert_eq!(1, categories.len());
                assert_eq!(Some("rust"), string(field(&categories[0], "slug")));
            }
            _ => panic!("wanted an array"),
        }
    }

    #[test]
    fn test_summarize() {
        let value = record("<p>Intro</p>\n<!-- more -->\n<p>Rest</p>\n").summarize();
        assert_eq!(Some("<p>Intro</p>\n"), string(field(&value, "summary")));
        assert!(matches!(field(&value, "summarized"), Value::Bool(true)));
        match value {
            Value::Object(m) => assert!(!m.contains_key("body")),
            _ => panic!("wanted an object"),
        }
    }
}
