//! Defines [`extract`], which splits a content file into its TOML front
//! matter and its Markdown body, and [`FrontMatter`], the typed view of the
//! keys the generator understands.
//!
//! A content file looks like this:
//!
//! ```md
//! +++
//! title = "Hello, world!"
//! date = 2021-04-16
//! [taxonomies]
//! categories = ["greet"]
//! +++
//! # Hello
//!
//! World
//! ```
//!
//! The front matter block is optional. A file which doesn't open with a `+++`
//! line is all body.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::fmt;
use toml::{Table, Value};

/// Opens and closes a front matter block. It must sit on a line of its own.
pub const DELIMITER: &str = "+++";

/// A content file split into its front matter mapping and its Markdown body.
#[derive(Clone, Debug, PartialEq)]
pub struct Document<'a> {
    /// Every key in the front matter block, including the ones the generator
    /// doesn't recognize.
    pub front_matter: Table,

    /// The text following the closing delimiter (or the whole file if there
    /// is no front matter block).
    pub body: &'a str,
}

impl Document<'_> {
    /// Serializes the front matter mapping back into TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(&self.front_matter)?)
    }

    /// The front matter re-emitted between [`DELIMITER`] lines, followed by
    /// the body rendered to HTML.
    pub fn render(&self) -> Result<String> {
        let html = crate::markdown::render(self.body);
        let toml = self.to_toml()?;
        let mut out = String::with_capacity(toml.len() + html.len() + 2 * DELIMITER.len() + 2);
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(&toml);
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(&html);
        Ok(out)
    }

    /// Converts the front matter mapping into a [`FrontMatter`].
    pub fn typed(&self) -> Result<FrontMatter> {
        FrontMatter::from_table(&self.front_matter)
    }
}

/// Splits `input` into a [`Document`]. If the first line of `input` is the
/// [`DELIMITER`], everything up to the next delimiter line is parsed as TOML
/// and the body starts on the line after it. Otherwise the front matter is
/// empty and the body is all of `input`.
pub fn extract(input: &str) -> Result<Document<'_>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let (first, block_start) = split_line(input);
    if !is_delimiter(first) {
        return Ok(Document {
            front_matter: Table::new(),
            body: input,
        });
    }

    let mut remaining = block_start;
    while !remaining.is_empty() {
        let (line, next) = split_line(remaining);
        if is_delimiter(line) {
            let block = &block_start[..block_start.len() - remaining.len()];
            return Ok(Document {
                front_matter: toml::from_str(block)?,
                body: next,
            });
        }
        remaining = next;
    }
    Err(Error::MissingClosingDelimiter)
}

fn split_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// The front matter keys the generator acts on. Unrecognized keys are
/// ignored here; they remain available in [`Document::front_matter`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,

    /// Drafts are parsed like everything else but are left out of the
    /// published site unless drafts are explicitly included.
    pub draft: bool,

    /// The name of the theme template to render the record with, e.g.
    /// `about.html`.
    pub template_page: Option<String>,

    /// `taxonomies.categories`, in the order they were written.
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
struct Raw {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    template_page: Option<String>,
    #[serde(default)]
    taxonomies: Taxonomies,
}

#[derive(Deserialize, Default)]
struct Taxonomies {
    #[serde(default)]
    categories: Vec<String>,
}

impl FrontMatter {
    /// Reads the recognized keys out of a front matter mapping.
    pub fn from_table(table: &Table) -> Result<FrontMatter> {
        let raw: Raw = Value::Table(table.clone()).try_into()?;
        Ok(FrontMatter {
            title: raw.title,
            description: raw.description,
            date: raw.date.as_ref().map(parse_date).transpose()?,
            draft: raw.draft,
            template_page: raw.template_page,
            categories: raw.taxonomies.categories,
        })
    }
}

/// Accepts a TOML date (or datetime, whose time is dropped), or a string in
/// either `YYYY-MM-DD` or RFC 3339 form.
fn parse_date(value: &Value) -> Result<NaiveDate> {
    match value {
        Value::Datetime(datetime) => datetime
            .date
            .and_then(|d| {
                NaiveDate::from_ymd_opt(d.year.into(), d.month.into(), d.day.into())
            })
            .ok_or_else(|| Error::InvalidDate(datetime.to_string())),
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
            .map_err(|_| Error::InvalidDate(s.clone())),
        other => Err(Error::InvalidDate(other.to_string())),
    }
}

/// Represents the result of a front matter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error extracting or interpreting front matter.
#[derive(Debug)]
pub enum Error {
    /// Returned when a file opens a front matter block but never closes it.
    MissingClosingDelimiter,

    /// Returned when the front matter block isn't valid TOML, or when a
    /// recognized key holds a value of the wrong type.
    Toml(toml::de::Error),

    /// Returned when the front matter can't be serialized back to TOML.
    Serialize(toml::ser::Error),

    /// Returned when `date` isn't an ISO-8601 date.
    InvalidDate(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingClosingDelimiter => {
                write!(f, "front matter is missing its closing `{}`", DELIMITER)
            }
            Error::Toml(err) => write!(f, "invalid front matter: {}", err),
            Error::Serialize(err) => err.fmt(f),
            Error::InvalidDate(date) => {
                write!(f, "invalid date `{}`: expected an ISO-8601 date", date)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingClosingDelimiter => None,
            Error::Toml(err) => Some(err),
            Error::Serialize(err) => Some(err),
            Error::InvalidDate(_) => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    /// Converts a [`toml::de::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`toml`] deserialization functions.
    fn from(err: toml::de::Error) -> Error {
        Error::Toml(err)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Error {
        Error::Serialize(err)
    }
}
