use url::{ParseError, Url};

pub const MARKDOWN_EXTENSION: &str = ".md";
pub const HTML_EXTENSION: &str = ".html";

/// Rewrites link destinations found in a content file so that links to other
/// content files (`*.md`) point at their rendered pages (`*.html`).
pub struct Converter<'a> {
    site_root: &'a Url,
    base: Url,
}

impl<'a> Converter<'a> {
    /// Constructs a new `Converter`
    ///
    /// # Arguments
    ///
    /// * `site_root` - the URL prefix for the whole site. Content files are
    ///   published at the same relative location under it, so it also acts as
    ///   the root of the content directory.
    /// * `base` - the path of the content file being rendered, relative to the
    ///   content directory. Relative destinations are resolved against it.
    pub fn new(site_root: &'a Url, base: &str) -> Result<Converter<'a>> {
        Ok(Converter {
            site_root,
            base: site_root.join(base)?,
        })
    }

    fn convert_absolute(&self, mut absolute: Url) -> Url {
        if let Some(relative) = self.site_root.make_relative(&absolute) {
            if !relative.starts_with("../") {
                if let Some(stem) = absolute.path().strip_suffix(MARKDOWN_EXTENSION) {
                    let path = format!("{}{}", stem, HTML_EXTENSION);
                    absolute.set_path(&path);
                }
            }
        }
        absolute
    }

    fn convert_unknown(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(self.convert_absolute(absolute)),
            Err(ParseError::RelativeUrlWithoutBase) => {
                Ok(self.convert_absolute(self.base.join(url)?))
            }
            Err(e) => Err(e),
        }
    }

    pub fn convert(&self, url: &str) -> Result<String> {
        Ok(self.convert_unknown(url)?.to_string())
    }
}

type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_convert_relative_post() -> Result<()> {
        fixture_basic("https://example.org/posts/relative.html", "relative.md")
    }

    #[test]
    fn test_convert_relative_post_leading_dotslash() -> Result<()> {
        fixture_basic("https://example.org/posts/relative.html", "./relative.md")
    }

    #[test]
    fn test_convert_relative_post_redundancies() -> Result<()> {
        fixture_basic(
            "https://example.org/posts/relative.html",
            "../posts/relative.md",
        )
    }

    #[test]
    fn test_convert_post_to_page() -> Result<()> {
        fixture_basic("https://example.org/about.html", "../about.md")
    }

    #[test]
    fn test_convert_root_relative_page() -> Result<()> {
        fixture_basic("https://example.org/about.html", "/about.md")
    }

    #[test]
    fn test_convert_keeps_fragment() -> Result<()> {
        fixture_basic(
            "https://example.org/posts/relative.html#section",
            "relative.md#section",
        )
    }

    #[test]
    fn test_convert_fragment_only() -> Result<()> {
        fixture_basic("https://example.org/posts/index.html#top", "#top")
    }

    #[test]
    fn test_convert_relative_asset() -> Result<()> {
        fixture_basic("https://example.org/posts/relative.jpg", "relative.jpg")
    }

    #[test]
    fn test_convert_static_asset() -> Result<()> {
        fixture_basic(
            "https://example.org/static/photo.jpg",
            "../static/photo.jpg",
        )
    }

    #[test]
    fn test_convert_absolute_post() -> Result<()> {
        fixture_basic(
            "https://example.org/posts/absolute.html",
            "https://example.org/posts/absolute.md",
        )
    }

    #[test]
    fn test_convert_absolute_asset_redundancies() -> Result<()> {
        fixture_basic(
            "https://example.org/posts/absolute.jpg",
            "https://example.org/posts/../posts/absolute.jpg",
        )
    }

    #[test]
    fn test_convert_remote_markdown() -> Result<()> {
        fixture_basic(
            "https://remote.org/absolute.md",
            "https://remote.org/absolute.md",
        )
    }

    #[test]
    fn test_convert_mailto() -> Result<()> {
        fixture_basic("mailto:me@example.org", "mailto:me@example.org")
    }

    #[test]
    fn test_convert_outside_site_root() -> Result<()> {
        fixture(
            "https://example.org/blog/",
            "posts/index.md",
            "https://example.org/elsewhere/notes.md",
            "/elsewhere/notes.md",
        )
    }

    fn fixture_basic(wanted: &str, target: &str) -> Result<()> {
        fixture("https://example.org/", "posts/index.md", wanted, target)
    }

    fn fixture(site_root: &str, base: &str, wanted: &str, target: &str) -> Result<()> {
        assert_eq!(
            wanted,
            Converter::new(&Url::parse(site_root)?, base)?.convert(target)?,
        );
        Ok(())
    }
}
