//! Renderer module: trait-based format dispatch over an entity subtree.

pub mod context;
pub mod json;
pub mod source;
pub mod summary;

use crate::config::FormatConfig;
use crate::error::{Error, Result};
use crate::model::EntityId;
use crate::tree::EntityTree;

pub use source::Layout;

/// Trait for rendering one subtree of an [`EntityTree`].
pub trait Renderer {
    fn render(&self, tree: &EntityTree, id: EntityId) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "source" | "lossless" => Ok(Box::new(source::SourceRenderer::lossless())),
        "normalized" => Ok(Box::new(source::SourceRenderer::normalized(FormatConfig::default()))),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(Error::UnknownFormat(format.to_string())),
    }
}
