//! Defines the [`Category`] type, which represents one entry of a
//! [`crate::content::Record`]'s `taxonomies.categories`.

use gtmpl::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use url::Url;

/// Represents a category a record is filed under. Categories are free text;
/// the `slug` is what identifies them, so `Rust` and `rust` are the same
/// category.
#[derive(Clone, Debug)]
pub struct Category {
    /// The category's name as it was first written in front matter.
    pub name: String,

    /// The slugified name. It names the category's index directory.
    pub slug: String,

    /// The URL for the category's first index page, i.e.
    /// `{categories_url}/{slug}/index.html`.
    pub url: Url,
}

impl Category {
    /// Builds a [`Category`] from its name. `categories_url` is the base URL of
    /// all category indices and must end in a trailing slash.
    pub fn new(name: &str, categories_url: &Url) -> Result<Category, url::ParseError> {
        let slug = slug::slugify(name);
        // `Url::join` treats a final segment without a trailing slash as a
        // file name and replaces it, so the slug and the file name are joined
        // in one go.
        let url = categories_url.join(&format!("{}/index.html", slug))?;
        Ok(Category {
            name: name.to_owned(),
            slug,
            url,
        })
    }
}

impl Hash for Category {
    /// Implements [`Hash`] for [`Category`] by delegating directly to the
    /// `slug` field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Category {
    /// Implements [`PartialEq`] and [`Eq`] for [`Category`] by delegating
    /// directly to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Category {}

impl From<&Category> for Value {
    /// Converts [`Category`]s into [`Value`]s for templating.
    fn from(c: &Category) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(c.name.clone()));
        m.insert("slug".to_owned(), Value::String(c.slug.clone()));
        m.insert("url".to_owned(), Value::String(c.url.to_string()));
        Value::Object(m)
    }
}
