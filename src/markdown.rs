use crate::url::Converter as LinkConverter;
use log::warn;
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use std::fmt;
use url::{ParseError as UrlParseError, Url};

/// Marks the end of a record's summary. Everything rendered before it is
/// shown on index pages.
pub const FOLD_TAG: &str = "<!-- more -->";

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts markdown to HTML, appending the result onto `w`.
///
/// * `site_root` is the prefix for published URLs (e.g.,
///   https://example.org/). This should end in a trailing slash.
/// * `source_path` is the relative path to the source file from the content
///   directory.
/// * `markdown` is the body of the source file.
pub fn to_html(
    w: &mut String,
    site_root: &Url,
    source_path: &str,
    markdown: &str,
) -> Result<(), Error> {
    let event_converter = EventConverter {
        link_converter: LinkConverter::new(site_root, source_path)?,
    };
    html::push_html(
        w,
        Parser::new_ext(markdown, options()).map(|ev| event_converter.convert(ev)),
    );
    Ok(())
}

/// Converts markdown to HTML without touching link destinations.
pub fn render(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options()));
    out
}

/// Splits rendered HTML at the first [`FOLD_TAG`]. Returns the summary and
/// whether anything was folded away.
pub fn summarize(html: &str) -> (&str, bool) {
    match html.find(FOLD_TAG) {
        Some(i) => (&html[..i], true),
        None => (html, false),
    }
}

struct EventConverter<'a> {
    link_converter: LinkConverter<'a>,
}

impl<'a> EventConverter<'a> {
    /// Destinations which aren't valid URLs are kept as written.
    fn convert_url<'b>(&self, url: CowStr<'b>) -> CowStr<'b> {
        match self.link_converter.convert(&url) {
            Ok(converted) => CowStr::from(converted),
            Err(err) => {
                warn!("Leaving link `{}` as written: {}", url, err);
                url
            }
        }
    }

    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Tag<'b> {
        match tag {
            // Links between content files need to be converted from their
            // input formats to their output formats (e.g., a post linking to
            // another post as `foo.md` will need to be converted to an
            // equivalent link ending in `foo.html`).
            Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            } if link_type != LinkType::Email => Tag::Link {
                link_type,
                dest_url: self.convert_url(dest_url),
                title,
                id,
            },
            Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            } => Tag::Image {
                link_type,
                dest_url: self.convert_url(dest_url),
                title,
                id,
            },
            _ => tag,
        }
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Event<'b> {
        match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)),
            _ => ev,
        }
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when the source file's own URL can't be built.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => write!(f, "invalid link: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn site_html(source_path: &str, markdown: &str) -> String {
        let site_root = Url::parse("https://example.org/").unwrap();
        let mut out = String::new();
        to_html(&mut out, &site_root, source_path, markdown).unwrap();
        out
    }

    #[test]
    fn test_paragraph_with_strong() {
        assert_eq!(
            "<p>Hello <strong>world</strong>.</p>",
            render("Hello **world**.").trim_end()
        );
    }

    #[test]
    fn test_fenced_code_keeps_literal_content() {
        let html = render("```rust\nfn main() { if a < b && c > d { run(); } }\n```\n");
        assert!(
            html.starts_with(r#"<pre><code class="language-rust">"#),
            "{}",
            html
        );
        assert!(html.contains("if a &lt; b &amp;&amp; c &gt; d { run(); }"), "{}", html);
        assert!(html.trim_end().ends_with("</code></pre>"), "{}", html);
    }

    #[test]
    fn test_fenced_code_without_language() {
        assert_eq!(
            "<pre><code>plain\n</code></pre>",
            render("```\nplain\n```\n").trim_end()
        );
    }

    #[test]
    fn test_block_elements() {
        let html = render(
            "## Heading\n\n\
             > quoted\n\n\
             - one\n\
             - two\n\n\
             | a | b |\n\
             |---|---|\n\
             | 1 | 2 |\n\n\
             ![alt](cat.png)\n",
        );
        assert!(html.contains("<h2>Heading</h2>"), "{}", html);
        assert!(html.contains("<blockquote>"), "{}", html);
        assert!(html.contains("<li>one</li>"), "{}", html);
        assert!(html.contains("<table>"), "{}", html);
        assert!(html.contains("<td>2</td>"), "{}", html);
        assert!(html.contains(r#"<img src="cat.png" alt="alt" />"#), "{}", html);
    }

    #[test]
    fn test_unrecognized_syntax_is_literal() {
        assert_eq!(
            "<p>[not a link and **not bold</p>",
            render("[not a link and **not bold").trim_end()
        );
    }

    #[test]
    fn test_links_to_content_are_rewritten() {
        let html = site_html(
            "posts/hello.md",
            "[next](world.md) [about](../about.md) [remote](https://rust-lang.org/x.md)",
        );
        assert!(
            html.contains(r#"<a href="https://example.org/posts/world.html">next</a>"#),
            "{}",
            html
        );
        assert!(
            html.contains(r#"<a href="https://example.org/about.html">about</a>"#),
            "{}",
            html
        );
        assert!(
            html.contains(r#"<a href="https://rust-lang.org/x.md">remote</a>"#),
            "{}",
            html
        );
    }

    #[test]
    fn test_images_resolve_against_source() {
        let html = site_html("posts/hello.md", "![cat](../static/cat.png)");
        assert!(
            html.contains(r#"src="https://example.org/static/cat.png""#),
            "{}",
            html
        );
    }

    #[test]
    fn test_invalid_destinations_are_kept() {
        let html = site_html(
            "posts/dev.md",
            "Start [your server](http://localhost:PORT/) and open [next](world.md).",
        );
        assert!(
            html.contains(r#"<a href="http://localhost:PORT/">your server</a>"#),
            "{}",
            html
        );
        assert!(
            html.contains(r#"<a href="https://example.org/posts/world.html">next</a>"#),
            "{}",
            html
        );
    }

    #[test]
    fn test_summarize() {
        let html = render("Intro.\n\n<!-- more -->\n\nRest.");
        let (summary, summarized) = summarize(&html);
        assert!(summarized);
        assert_eq!("<p>Intro.</p>", summary.trim_end());

        let (summary, summarized) = summarize("<p>All of it.</p>\n");
        assert!(!summarized);
        assert_eq!("<p>All of it.</p>\n", summary);
    }
}
