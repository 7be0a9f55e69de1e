//! Defines the [`Parser`], [`Parsed`], [`Failure`] and [`Error`] types, and
//! the logic for parsing content files from the file system into
//! [`Record`]s. See [`Record::to_value`] and [`Record::summarize`] for how
//! records are converted into template values.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use log::debug;
use url::Url;
use walkdir::{DirEntry, WalkDir};

use crate::{
    category::Category,
    content::{Kind, Record, POSTS_DIRECTORY},
    frontmatter, markdown,
    url::{HTML_EXTENSION, MARKDOWN_EXTENSION},
};

/// Parses [`Record`] objects from content files.
pub struct Parser<'a> {
    /// `site_root` is the base URL of the published site. A content file at
    /// `{content_dir}/foo/bar.md` is published at `{site_root}/foo/bar.html`.
    site_root: &'a Url,

    /// `categories_url` is the base URL for category index pages (i.e., the
    /// URL for the first page of a category is
    /// `{categories_url}/{slug}/index.html`).
    categories_url: &'a Url,
}

/// The outcome of parsing a content directory: the records which parsed and
/// the files which didn't.
#[derive(Debug, Default)]
pub struct Parsed {
    /// Posts (most recent first) followed by pages (by title).
    pub records: Vec<Record>,

    pub failures: Vec<Failure>,
}

impl Parsed {
    pub fn posts(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.kind == Kind::Post)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.kind == Kind::Page)
    }
}

/// A content file which couldn't be turned into a [`Record`].
#[derive(Debug)]
pub struct Failure {
    /// The path of the file relative to the content directory.
    pub path: PathBuf,
    pub error: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(site_root: &'a Url, categories_url: &'a Url) -> Parser<'a> {
        Parser {
            site_root,
            categories_url,
        }
    }

    /// Searches `content_directory` recursively for content files (extension
    /// = `.md`) and parses each of them. Hidden files and directories are
    /// skipped. A file which fails to parse is recorded as a [`Failure`] and
    /// doesn't stop the others from being parsed; only a failure to walk the
    /// directory itself is returned as an error.
    pub fn parse_records(&self, content_directory: &Path) -> Result<Parsed> {
        let mut parsed = Parsed::default();
        let walker = WalkDir::new(content_directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file()
                || !entry.file_name().to_string_lossy().ends_with(MARKDOWN_EXTENSION)
            {
                continue;
            }

            // strip_prefix() should never fail since every entry is below
            // `content_directory`
            let relative_path = entry
                .path()
                .strip_prefix(content_directory)
                .unwrap_or_else(|_| entry.path())
                .to_owned();
            match self.parse_file(content_directory, &relative_path) {
                Ok(record) => {
                    debug!("Parsed `{}`", relative_path.display());
                    parsed.records.push(record);
                }
                Err(error) => {
                    debug!("Failed to parse `{}`", relative_path.display());
                    parsed.failures.push(Failure {
                        path: relative_path,
                        error,
                    });
                }
            }
        }

        sort_records(&mut parsed.records);
        Ok(parsed)
    }

    /// Reads and parses the content file at `relative_path` (relative to
    /// `content_directory`). Errors are annotated with the file's path.
    pub fn parse_file(&self, content_directory: &Path, relative_path: &Path) -> Result<Record> {
        std::fs::read_to_string(content_directory.join(relative_path))
            .map_err(Error::from)
            .and_then(|input| self.parse_str(relative_path, &input))
            .map_err(|e| Error::Annotated(format!("parsing `{}`", relative_path.display()), Box::new(e)))
    }

    /// Parses a single [`Record`] from its path relative to the content
    /// directory and its contents.
    pub fn parse_str(&self, relative_path: &Path, input: &str) -> Result<Record> {
        let id = record_id(relative_path)?;
        let document = frontmatter::extract(input)?;
        let front_matter = document.typed()?;

        let kind = match relative_path.components().next() {
            Some(Component::Normal(first))
                if first == POSTS_DIRECTORY && relative_path.components().count() > 1 =>
            {
                Kind::Post
            }
            _ => Kind::Page,
        };

        let mut categories: Vec<Category> = Vec::with_capacity(front_matter.categories.len());
        for name in front_matter.categories.iter() {
            let category = Category::new(name, self.categories_url)?;
            if !categories.contains(&category) {
                categories.push(category);
            }
        }

        let mut body = String::new();
        markdown::to_html(
            &mut body,
            self.site_root,
            &format!("{}{}", id, MARKDOWN_EXTENSION),
            document.body,
        )?;

        Ok(Record {
            title: match &front_matter.title {
                Some(title) => title.clone(),
                None => id.rsplit('/').next().unwrap_or(&id).to_owned(),
            },
            url: self.site_root.join(&format!("{}{}", id, HTML_EXTENSION))?,
            file_path: relative_path.with_extension(&HTML_EXTENSION[1..]),
            extra: document.front_matter,
            id,
            kind,
            front_matter,
            categories,
            body,
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Turns `posts/hello.md` into `posts/hello`.
fn record_id(relative_path: &Path) -> Result<String> {
    let stem = relative_path.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?,
            ),
            _ => return Err(InvalidFileNameError(relative_path.to_owned()).into()),
        }
    }
    if parts.is_empty() {
        return Err(InvalidFileNameError(relative_path.to_owned()).into());
    }
    Ok(parts.join("/"))
}

/// Posts first, most recent first, with undated posts last; then pages by
/// title. Ties break on the id so the order is stable across runs.
fn sort_records(records: &mut [Record]) {
    use std::cmp::Ordering;

    fn by_date(a: &Record, b: &Record) -> Ordering {
        match (a.date(), b.date()) {
            (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    records.sort_by(|a, b| match (a.kind, b.kind) {
        (Kind::Post, Kind::Page) => Ordering::Less,
        (Kind::Page, Kind::Post) => Ordering::Greater,
        (Kind::Post, Kind::Post) => by_date(a, b).then_with(|| a.id.cmp(&b.id)),
        (Kind::Page, Kind::Page) => a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)),
    });
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a [`Record`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Record`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter is missing its closing delimiter, isn't
    /// valid TOML, or holds invalid values.
    Frontmatter(frontmatter::Error),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Frontmatter(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Frontmatter(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<frontmatter::Error> for Error {
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        match err {
            markdown::Error::UrlParse(e) => Error::UrlParse(e),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn urls() -> (Url, Url) {
        (
            Url::parse("https://example.com/").unwrap(),
            Url::parse("https://example.com/categories/").unwrap(),
        )
    }

    fn write(dir: &Path, relative_path: &str, contents: &str) {
        let path = dir.join(relative_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_str() -> Result<()> {
        let (site_root, categories_url) = urls();
        let parser = Parser::new(&site_root, &categories_url);
        let record = parser.parse_str(
            Path::new("posts/simple.md"),
            "+++\n\
             title = \"Simple\"\n\
             date = 2021-01-01\n\
             [taxonomies]\n\
             categories = [\"Rust\", \"rust\", \"Meta\"]\n\
             +++\n\
             Today is the first day of the year.\n",
        )?;

        assert_eq!("posts/simple", record.id);
        assert_eq!(Kind::Post, record.kind);
        assert_eq!("Simple", record.title);
        assert_eq!(NaiveDate::from_ymd_opt(2021, 1, 1), record.date());
        assert_eq!("https://example.com/posts/simple.html", record.url.as_str());
        assert_eq!(PathBuf::from("posts/simple.html"), record.file_path);
        assert_eq!(
            "<p>Today is the first day of the year.</p>\n",
            record.body
        );
        let slugs: Vec<&str> = record.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(vec!["rust", "meta"], slugs);
        Ok(())
    }

    #[test]
    fn test_parse_str_page_without_front_matter() -> Result<()> {
        let (site_root, categories_url) = urls();
        let parser = Parser::new(&site_root, &categories_url);
        let record = parser.parse_str(Path::new("about.md"), "I write things.")?;

        assert_eq!(Kind::Page, record.kind);
        assert_eq!("about", record.title);
        assert!(record.extra.is_empty());
        assert_eq!("https://example.com/about.html", record.url.as_str());
        Ok(())
    }

    #[test]
    fn test_parse_str_draft() -> Result<()> {
        let (site_root, categories_url) = urls();
        let parser = Parser::new(&site_root, &categories_url);
        let record = parser.parse_str(
            Path::new("posts/wip.md"),
            "+++\ntitle = \"WIP\"\ndraft = true\n+++\n",
        )?;
        assert!(record.is_draft());
        assert_eq!(
            Some(&toml::Value::Boolean(true)),
            record.extra.get("draft")
        );
        Ok(())
    }

    #[test]
    fn test_parse_str_keeps_invalid_link() -> Result<()> {
        let (site_root, categories_url) = urls();
        let parser = Parser::new(&site_root, &categories_url);
        let record = parser.parse_str(
            Path::new("posts/dev.md"),
            "+++\ntitle = \"Dev\"\n+++\nRun [your server](http://localhost:PORT/).",
        )?;
        assert!(
            record.body.contains(r#"href="http://localhost:PORT/""#),
            "{}",
            record.body
        );
        Ok(())
    }

    #[test]
    fn test_parse_records() -> Result<()> {
        let (site_root, categories_url) = urls();
        let dir = tempfile::tempdir()?;
        write(dir.path(), "posts/old.md", "+++\ntitle = \"Old\"\ndate = 2019-05-01\n+++\nold");
        write(dir.path(), "posts/new.md", "+++\ntitle = \"New\"\ndate = 2022-05-01\n+++\nnew");
        write(dir.path(), "posts/undated.md", "+++\ntitle = \"Undated\"\n+++\n");
        write(dir.path(), "posts/broken.md", "+++\ntitle = \"Broken\"\nno closing fence\n");
        write(dir.path(), "posts/bad-toml.md", "+++\ntitle = \n+++\n");
        write(dir.path(), "posts/image.png", "not markdown");
        write(dir.path(), ".hidden/secret.md", "+++\ntitle = \"Secret\"\n+++\n");
        write(dir.path(), "posts/.draft.md", "+++\ntitle = \"Swap\"\n+++\n");
        write(dir.path(), "about.md", "+++\ntitle = \"About\"\n+++\nme");
        write(dir.path(), "contact.md", "+++\ntitle = \"Contact\"\n+++\nyou");

        let parser = Parser::new(&site_root, &categories_url);
        let parsed = parser.parse_records(dir.path())?;

        let ids: Vec<&str> = parsed.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            vec!["posts/new", "posts/old", "posts/undated", "about", "contact"],
            ids
        );
        assert_eq!(3, parsed.posts().count());
        assert_eq!(2, parsed.pages().count());

        let mut failed: Vec<&Path> = parsed.failures.iter().map(|f| f.path.as_path()).collect();
        failed.sort();
        assert_eq!(
            vec![Path::new("posts/bad-toml.md"), Path::new("posts/broken.md")],
            failed
        );
        let broken = parsed
            .failures
            .iter()
            .find(|f| f.path == Path::new("posts/broken.md"))
            .unwrap();
        assert!(broken.to_string().contains("posts/broken.md"), "{}", broken);
        assert!(broken.to_string().contains("closing"), "{}", broken);
        Ok(())
    }

    #[test]
    fn test_parse_records_missing_directory() {
        let (site_root, categories_url) = urls();
        let parser = Parser::new(&site_root, &categories_url);
        assert!(parser
            .parse_records(Path::new("./testdata/does-not-exist"))
            .is_err());
    }

    #[test]
    fn test_record_id() -> Result<()> {
        assert_eq!("posts/a/b", record_id(Path::new("posts/a/b.md"))?);
        assert!(record_id(Path::new("../escape.md")).is_err());
        Ok(())
    }
}
