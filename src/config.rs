//! Loads the project file, `folio.toml`, and derives every source and output
//! location from it.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file. Its directory is the project root.
pub const PROJECT_FILE: &str = "folio.toml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct Project {
    pub title: String,
    pub site_root: Url,

    #[serde(default)]
    pub author: Option<Author>,

    #[serde(default)]
    pub index_page_size: PageSize,

    #[serde(default)]
    pub include_drafts: bool,

    #[serde(default)]
    pub theme: Theme,
}

#[derive(Deserialize)]
struct Theme {
    #[serde(default = "Theme::default_directory")]
    directory: PathBuf,

    #[serde(default = "Theme::default_stylesheet")]
    stylesheet: PathBuf,
}

impl Theme {
    fn default_directory() -> PathBuf {
        PathBuf::from("theme")
    }

    fn default_stylesheet() -> PathBuf {
        PathBuf::from("style.css")
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            directory: Theme::default_directory(),
            stylesheet: Theme::default_stylesheet(),
        }
    }
}

/// The site's author, credited in the feed.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub title: String,
    pub author: Option<Author>,

    pub home_page: Url,
    pub index_url: Url,
    pub categories_url: Url,
    pub static_url: Url,
    pub stylesheet_url: Url,
    pub feed_url: Url,

    pub content_source_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub stylesheet: PathBuf,

    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub categories_output_directory: PathBuf,
    pub static_output_directory: PathBuf,

    pub index_page_size: usize,
    pub include_drafts: bool,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its ancestors,
    /// and loads the first one found. `output_directory` overrides the
    /// default output location, `{project_root}/_site`.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        use crate::util::read_to_string;
        let project: Project = toml::from_str(&read_to_string(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        if project.index_page_size.0 < 1 {
            return Err(anyhow!("`index_page_size` must be at least 1"));
        }

        let site_root = directory_url(project.site_root);
        let theme_dir = project_root.join(&project.theme.directory);
        let stylesheet_name = project
            .theme
            .stylesheet
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Invalid stylesheet path {:?}", project.theme.stylesheet))?
            .to_owned();
        let static_url = site_root.join("static/")?;
        let root_output_directory = match output_directory {
            Some(dir) => dir.to_owned(),
            None => project_root.join("_site"),
        };

        Ok(Config {
            title: project.title,
            author: project.author,
            index_url: site_root.join("pages/")?,
            categories_url: site_root.join("categories/")?,
            stylesheet_url: static_url.join(&stylesheet_name)?,
            feed_url: site_root.join("feed.atom")?,
            static_url,
            home_page: site_root,
            content_source_directory: project_root.join("content"),
            static_source_directory: project_root.join("static"),
            templates_directory: theme_dir.join("templates"),
            stylesheet: theme_dir.join(&project.theme.stylesheet),
            index_output_directory: root_output_directory.join("pages"),
            categories_output_directory: root_output_directory.join("categories"),
            static_output_directory: root_output_directory.join("static"),
            root_output_directory,
            index_page_size: project.index_page_size.0,
            include_drafts: project.include_drafts,
        })
    }
}

/// Makes sure `url` ends in a slash so that [`Url::join`] treats it as a
/// directory.
fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
