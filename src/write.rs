use crate::category::Category;
use crate::content::{Kind, Record};
use crate::template::Templates;
use gtmpl::{Template, Value};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The template for the main index pages.
pub const INDEX_TEMPLATE: &str = "index.html";

/// The template for category index pages. Themes which don't provide it get
/// [`INDEX_TEMPLATE`] instead.
pub const CATEGORY_TEMPLATE: &str = "category.html";

/// The optional template for the list of all categories.
pub const CATEGORIES_TEMPLATE: &str = "categories.html";

/// Site-wide values made available to every template under `site`.
pub struct Site<'a> {
    pub title: &'a str,

    /// The URL for the site's home page, typically the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The URL of the theme's stylesheet.
    pub stylesheet_url: &'a Url,

    /// The URL for the static assets.
    pub static_url: &'a Url,

    pub feed_url: &'a Url,
}

/// Responsible for indexing, templating, and writing HTML pages to disk from
/// [`Record`]s.
pub struct Writer<'a> {
    pub templates: &'a Templates,

    pub site: Site<'a>,

    /// The base URL for the main index pages. They will be located at
    /// `{index_base_url}/index.html`, `{index_base_url}/1.html`, etc.
    pub index_base_url: &'a Url,

    /// The directory in which the main index HTML files will be written.
    pub index_output_directory: &'a Path,

    /// The base URL for category index pages. The pages of a category will
    /// be located at `{categories_base_url}/{slug}/index.html`,
    /// `{categories_base_url}/{slug}/1.html`, etc.
    pub categories_base_url: &'a Url,

    /// The directory in which category index HTML files will be written.
    pub categories_output_directory: &'a Path,

    /// The directory under which post and page files are written, at their
    /// [`Record::file_path`].
    pub root_output_directory: &'a Path,

    /// The number of posts per index page.
    pub index_page_size: usize,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page, navigation: &Value) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert("site".to_owned(), self.site_value(navigation));
        }
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        Ok(())
    }

    fn site_value(&self, navigation: &Value) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.site.title.to_owned()));
        m.insert(
            "home_page".to_owned(),
            Value::String(self.site.home_page.to_string()),
        );
        m.insert(
            "stylesheet_url".to_owned(),
            Value::String(self.site.stylesheet_url.to_string()),
        );
        m.insert(
            "static_url".to_owned(),
            Value::String(self.site.static_url.to_string()),
        );
        m.insert(
            "feed_url".to_owned(),
            Value::String(self.site.feed_url.to_string()),
        );
        m.insert("navigation".to_owned(), navigation.clone());
        Value::Object(m)
    }

    /// Takes the records to publish, indexes the posts by category, and
    /// writes record pages, index pages and category pages to disk. Every
    /// record's template must exist. Returns the number of files written.
    pub fn write_records(&self, records: &[&Record]) -> Result<usize> {
        use std::collections::HashSet;

        let posts: Vec<&Record> = records
            .iter()
            .copied()
            .filter(|r| r.kind == Kind::Post)
            .collect();
        let navigation = Value::Array(
            records
                .iter()
                .filter(|r| r.kind == Kind::Page)
                .map(|r| r.to_link())
                .collect(),
        );

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut written = 0;
        for page in self.pages(records, &posts)? {
            if let Some(dir) = page.file_path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir)?;
                }
            }
            debug!("Writing `{}`", page.file_path.display());
            self.write_page(&page, &navigation)?;
            written += 1;
        }
        Ok(written)
    }

    /// Creates every [`Page`]: one per record, the main index, one index per
    /// category and, if the theme has a template for it, the category list.
    fn pages<'t>(&'t self, records: &[&'t Record], posts: &[&'t Record]) -> Result<Vec<Page<'t>>> {
        let mut pages = self.record_pages(records, posts)?;

        let main_index = Index {
            url: self.index_base_url.to_owned(),
            output_directory: self.index_output_directory.to_owned(),
            category: None,
            posts: posts.to_vec(),
        };
        pages.extend(main_index.to_pages(self.index_page_size, self.template(INDEX_TEMPLATE)?));

        let categories = index_categories(
            self.categories_base_url,
            self.categories_output_directory,
            posts,
        )?;
        let category_template = match self.templates.get(CATEGORY_TEMPLATE) {
            Some(template) => template,
            None => self.template(INDEX_TEMPLATE)?,
        };
        for index in categories.iter() {
            pages.extend(index.to_pages(self.index_page_size, category_template));
        }

        if let Some(template) = self.templates.get(CATEGORIES_TEMPLATE) {
            pages.push(Page {
                item: Value::Array(categories.iter().map(Index::overview).collect()),
                file_path: self.categories_output_directory.join("index.html"),
                prev: None,
                next: None,
                template,
                category: Value::Nil,
                number: Value::Nil,
            });
        }
        Ok(pages)
    }

    /// Creates the [`Page`] for each record. Posts link to their neighbors
    /// in `posts` (most recent first) via `prev` and `next`.
    fn record_pages<'t>(
        &'t self,
        records: &[&'t Record],
        posts: &[&'t Record],
    ) -> Result<Vec<Page<'t>>> {
        let mut pages = Vec::with_capacity(records.len());
        for record in records {
            let (prev, next) = match posts.iter().position(|p| p.id == record.id) {
                Some(i) if record.kind == Kind::Post => (
                    match i < 1 {
                        true => None,
                        false => Some(posts[i - 1].url.clone()),
                    },
                    posts.get(i + 1).map(|p| p.url.clone()),
                ),
                _ => (None, None),
            };
            pages.push(Page {
                item: record.to_value(),
                file_path: self.root_output_directory.join(&record.file_path),
                prev,
                next,
                template: self.template(record.template_name())?,
                category: Value::Nil,
                number: Value::Nil,
            });
        }
        Ok(pages)
    }

    fn template(&self, name: &str) -> Result<&Template> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::UnknownTemplate(name.to_owned()))
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page: a record, or an array of summarized
    /// records for index pages.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,

    /// The category a category index page lists, otherwise nil.
    category: Value,

    /// The 1-based number of an index page, otherwise nil.
    number: Value,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, `next`, `category` and `page` (see
    /// [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        m.insert("category".to_owned(), self.category.clone());
        m.insert("page".to_owned(), self.number.clone());
        Value::Object(m)
    }
}

/// `Index` represents a collection of posts associated with a category (or
/// with no category, which is the main index containing all posts).
struct Index<'a> {
    /// The base URL for the index's pages. It ends in a slash.
    url: Url,

    /// The output directory for the index's pages.
    output_directory: PathBuf,

    category: Option<Category>,

    /// The posts associated with the index, most recent first.
    posts: Vec<&'a Record>,
}

impl Index<'_> {
    /// Converts the index to a list of index pages. `index_page_size` and
    /// `index_template` represent the number of posts per page and the template
    /// to apply to the pages respectively. An index without posts still gets
    /// a single, empty page.
    fn to_pages<'t>(&self, index_page_size: usize, index_template: &'t Template) -> Vec<Page<'t>> {
        let chunks: Vec<&[&Record]> = match self.posts.is_empty() {
            true => vec![&self.posts[..]],
            false => self.posts.chunks(index_page_size).collect(),
        };
        let total_pages = chunks.len();
        let category = match &self.category {
            Some(category) => Value::from(category),
            None => Value::Nil,
        };

        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Page {
                item: Value::Array(chunk.iter().map(|p| p.summarize()).collect()),
                file_path: self.output_directory.join(page_file_name(i)),
                prev: match i {
                    0 => None,
                    _ => self.url.join(&page_file_name(i - 1)).ok(),
                },
                next: match i + 1 < total_pages {
                    false => None,
                    true => self.url.join(&page_file_name(i + 1)).ok(),
                },
                template: index_template,
                category: category.clone(),
                number: Value::String((i + 1).to_string()),
            })
            .collect()
    }

    /// A summary of the index for the category list: the category's fields
    /// plus links to its posts.
    fn overview(&self) -> Value {
        let mut value = match &self.category {
            Some(category) => Value::from(category),
            None => Value::Object(HashMap::new()),
        };
        if let Value::Object(m) = &mut value {
            m.insert(
                "posts".to_owned(),
                Value::Array(self.posts.iter().map(|p| p.to_link()).collect()),
            );
        }
        value
    }
}

fn page_file_name(i: usize) -> String {
    match i > 0 {
        false => String::from("index.html"),
        true => format!("{}.html", i),
    }
}

/// Groups `posts` by category, keeping the order in which categories are
/// first seen (posts are most recent first, so categories are ordered by
/// their most recent post).
///
/// Arguments:
///
/// * `base_url` is the base URL for category index pages. See
///   [`Writer::categories_base_url`] for more details.
/// * `base_directory` is the base directory for category index pages. See
///   [`Writer::categories_output_directory`] for more details.
/// * `posts` is the collection of posts to index.
fn index_categories<'a>(
    base_url: &Url,
    base_directory: &Path,
    posts: &[&'a Record],
) -> Result<Vec<Index<'a>>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut indices: Vec<Index> = Vec::new();

    for &post in posts {
        for category in post.categories.iter() {
            match positions.get(&category.slug) {
                Some(&i) => indices[i].posts.push(post),
                None => {
                    positions.insert(category.slug.clone(), indices.len());
                    indices.push(Index {
                        url: base_url.join(&format!("{}/", category.slug))?,
                        output_directory: base_directory.join(&category.slug),
                        category: Some(category.clone()),
                        posts: vec![post],
                    });
                }
            }
        }
    }

    Ok(indices)
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// Returned when a page needs a template the theme doesn't have.
    UnknownTemplate(String),

    /// Returned when there is a problem building index URLs.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UnknownTemplate(name) => {
                write!(f, "the theme has no template named `{}`", name)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::UnknownTemplate(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
