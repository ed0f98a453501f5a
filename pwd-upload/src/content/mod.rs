//! Reading blog posts: file discovery, front matter and slugs.

pub mod front_matter;
pub mod scan;
pub mod slug;

pub use front_matter::{parse_document, FrontMatter, FrontMatterError};
pub use scan::{markdown_files, ScanError};
pub use slug::{resolve_slug, slugify};
