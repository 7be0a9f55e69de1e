//! Loads the theme's templates. Every `*.html` file in the templates
//! directory becomes a template named after its file name; `base.html`, if
//! present, is prepended to each of them rather than being a template of its
//! own.

use gtmpl::Template;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The file prepended to every other template.
pub const BASE_TEMPLATE: &str = "base.html";

/// The theme's parsed templates, by name.
pub struct Templates {
    templates: HashMap<String, Template>,
}

impl Templates {
    /// Parses every template in `dir`.
    pub fn load(dir: &Path) -> Result<Templates> {
        let base_path = dir.join(BASE_TEMPLATE);
        let base = if base_path.is_file() {
            read(&base_path)?
        } else {
            String::new()
        };

        let mut sources = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|err| Error::OpenTemplateFile {
            path: dir.to_owned(),
            err,
        })?;
        for entry in entries {
            let path = entry?.path();
            let name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_owned(),
                None => continue,
            };
            if !path.is_file() || !name.ends_with(".html") || name == BASE_TEMPLATE {
                continue;
            }
            sources.push((name, read(&path)?));
        }

        Templates::from_sources(&base, sources)
    }

    /// Parses templates from `(name, source)` pairs, prepending `base` to each
    /// source.
    pub fn from_sources<N, S>(base: &str, sources: impl IntoIterator<Item = (N, S)>) -> Result<Templates>
    where
        N: Into<String>,
        S: AsRef<str>,
    {
        let mut templates = HashMap::new();
        for (name, source) in sources {
            let name = name.into();
            let mut contents = String::with_capacity(base.len() + source.as_ref().len() + 1);
            if !base.is_empty() {
                contents.push_str(base);
                contents.push('\n');
            }
            contents.push_str(source.as_ref());

            let mut template = Template::default();
            template
                .parse(contents)
                .map_err(|err| Error::ParseTemplate { name: name.clone(), err })?;
            debug!("Loaded template `{}`", name);
            templates.insert(name, template);
        }
        Ok(Templates { templates })
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the theme's templates.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: String, err: String },

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "Parsing template '{}': {}", name, err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate { .. } => None,
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
