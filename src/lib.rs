//! The library code for the `folio` static site generator. Content is a
//! directory of Markdown files, each with an optional `+++`-delimited TOML
//! front matter block. The architecture can be generally broken down into two
//! distinct steps:
//!
//! 1. Parsing records from source files on disk ([`crate::parser`]), which
//!    extracts the front matter ([`crate::frontmatter`]) and renders the body
//!    ([`crate::markdown`]).
//! 2. Converting the records into output files on disk ([`crate::write`]).
//!
//! Of the two, the second step is the more involved. Posts are grouped into
//! indices: one for all posts and another for each category. Each index is
//! paginated into pages of a configurable number of posts. Every record and
//! every index page is then rendered with a theme template
//! ([`crate::template`]) and written to disk.
//!
//! [`crate::build`] ties the steps together and also copies the theme's
//! stylesheet and the static files, and writes the Atom feed
//! ([`crate::feed`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod category;
pub mod config;
pub mod content;
pub mod feed;
pub mod frontmatter;
pub mod markdown;
pub mod parser;
pub mod template;
pub mod url;
pub mod util;
pub mod write;
