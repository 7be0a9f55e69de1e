//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the content
//! ([`crate::parser`]), rendering record and index pages ([`crate::write`]),
//! copying the static directory and the theme's stylesheet into the static
//! output directory, and generating the Atom feed. [`check_site`] runs the
//! same checks without writing anything.

use crate::config::Config;
use crate::content::{Kind, Record};
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::parser::{Error as ParseError, Parsed, Parser};
use crate::template::{Error as TemplateError, Templates};
use crate::write::{Error as WriteError, Site, Writer};
use log::{error, info, warn};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Tallies what a build (or check) did with the content directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Records published as pages of their own.
    pub records: usize,

    /// Every HTML file written, including index and category pages.
    pub files: usize,

    /// Drafts left out because `include_drafts` is off.
    pub drafts: usize,

    /// Files which couldn't be parsed, plus records naming a template the
    /// theme doesn't have or written where a generated file goes.
    pub failures: usize,
}

impl Report {
    pub fn succeeded(&self) -> bool {
        self.failures == 0
    }
}

/// Builds the site from a [`Config`] object. This calls into
/// [`Parser::parse_records`], [`Writer::write_records`], and
/// [`write_feed`] which do the heavy-lifting. A file which fails to parse or
/// names an unknown template is logged and counted in the [`Report`] but
/// doesn't stop the rest of the site from being written.
pub fn build_site(config: &Config) -> Result<Report> {
    let (parsed, templates) = load(config)?;
    let mut report = Report::default();
    let records = publishable(config, &parsed, &templates, &mut report);

    // Blow away the old output directories so we don't have any collisions.
    // Pages outside of `posts/` are simply overwritten; we don't want to
    // naively delete the whole root output directory in case the user passes
    // the wrong one.
    rmdir(&config.root_output_directory.join(crate::content::POSTS_DIRECTORY))?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.categories_output_directory)?;
    rmdir(&config.static_output_directory)?;
    std::fs::create_dir_all(&config.root_output_directory)?;

    // write the record, index and category pages
    info!("Writing {} records", records.len());
    let writer = Writer {
        templates: &templates,
        site: Site {
            title: &config.title,
            home_page: &config.home_page,
            stylesheet_url: &config.stylesheet_url,
            static_url: &config.static_url,
            feed_url: &config.feed_url,
        },
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        categories_base_url: &config.categories_url,
        categories_output_directory: &config.categories_output_directory,
        root_output_directory: &config.root_output_directory,
        index_page_size: config.index_page_size,
    };
    report.files = writer.write_records(&records)?;
    report.records = records.len();

    // copy static directory and the stylesheet
    if config.static_source_directory.is_dir() {
        info!("Copying `{}`", config.static_source_directory.display());
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    }
    copy_stylesheet(config)?;

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // create the atom feed
    let posts: Vec<&Record> = records
        .iter()
        .copied()
        .filter(|r| r.kind == Kind::Post)
        .collect();
    info!("Writing the feed ({} posts)", posts.len());
    write_feed(
        FeedConfig {
            title: config.title.clone(),
            id: config.home_page.to_string(),
            author: config.author.clone(),
            home_page: config.home_page.clone(),
            feed_url: config.feed_url.clone(),
        },
        &posts,
        File::create(config.root_output_directory.join("feed.atom"))?,
    )?;

    info!(
        "Wrote {} files for {} records ({} drafts skipped, {} failures)",
        report.files, report.records, report.drafts, report.failures
    );
    Ok(report)
}

/// Parses every content file and checks every record's template without
/// writing anything.
pub fn check_site(config: &Config) -> Result<Report> {
    let (parsed, templates) = load(config)?;
    let mut report = Report::default();
    let records = publishable(config, &parsed, &templates, &mut report);
    report.records = records.len();
    Ok(report)
}

fn load(config: &Config) -> Result<(Parsed, Templates)> {
    info!(
        "Parsing content in `{}`",
        config.content_source_directory.display()
    );
    let parser = Parser::new(&config.home_page, &config.categories_url);
    let parsed = parser.parse_records(&config.content_source_directory)?;

    info!("Loading templates from `{}`", config.templates_directory.display());
    let templates = Templates::load(&config.templates_directory)?;
    Ok((parsed, templates))
}

/// Logs the parse failures and picks the records which can be published:
/// drafts are dropped unless drafts are included, and records whose template
/// is missing or whose output would clobber a generated file are failures.
fn publishable<'a>(
    config: &Config,
    parsed: &'a Parsed,
    templates: &Templates,
    report: &mut Report,
) -> Vec<&'a Record> {
    for failure in parsed.failures.iter() {
        error!("{}", failure);
        report.failures += 1;
    }

    let mut records = Vec::with_capacity(parsed.records.len());
    for record in parsed.records.iter() {
        if record.is_draft() && !config.include_drafts {
            info!("Skipping draft `{}`", record.id);
            report.drafts += 1;
            continue;
        }
        if is_reserved(config, &record.file_path) {
            error!(
                "Skipping `{}{}`: its output `{}` is reserved for generated files",
                record.id,
                crate::url::MARKDOWN_EXTENSION,
                record.file_path.display()
            );
            report.failures += 1;
            continue;
        }
        let template = record.template_name();
        if !templates.contains(template) {
            error!(
                "Skipping `{}`: {}",
                record.id,
                WriteError::UnknownTemplate(template.to_owned())
            );
            report.failures += 1;
            continue;
        }
        records.push(record);
    }
    records
}

/// Whether `file_path` (relative to the output directory) is the home page,
/// the feed, or inside a directory the build generates.
fn is_reserved(config: &Config, file_path: &Path) -> bool {
    let root = &config.root_output_directory;
    let path = root.join(file_path);
    path == root.join("index.html")
        || path == root.join("feed.atom")
        || path.starts_with(&config.index_output_directory)
        || path.starts_with(&config.categories_output_directory)
        || path.starts_with(&config.static_output_directory)
}

fn copy_stylesheet(config: &Config) -> Result<()> {
    let name = match config.stylesheet.file_name() {
        Some(name) => name,
        None => return Ok(()),
    };
    if !config.stylesheet.is_file() {
        warn!(
            "Stylesheet `{}` not found; not copying it",
            config.stylesheet.display()
        );
        return Ok(());
    }
    std::fs::create_dir_all(&config.static_output_directory)?;
    std::fs::copy(
        &config.stylesheet,
        config.static_output_directory.join(name),
    )?;
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }

    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. These abort the build; problems with
/// individual content files are counted in the [`Report`] instead.
#[derive(Debug)]
pub enum Error {
    /// Returned when the content directory can't be walked.
    Parse(ParseError),

    /// Returned when the theme's templates can't be loaded.
    Template(TemplateError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Feed(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Feed(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}
