//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod markdown;

use anyhow::{anyhow, bail, Result};
use jsdoclet_core::Processed;

/// Renders a processed collection. Renderers never modify it.
pub trait Renderer {
    fn render(&self, processed: &Processed) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name. The longname tree is only
/// available as JSON.
pub fn create_renderer(format: &str, tree: bool) -> Result<Box<dyn Renderer>> {
    match format {
        "json" => Ok(Box::new(json::JsonRenderer { tree })),
        "markdown" | "md" if tree => bail!("--tree is only supported with --format json"),
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use json or markdown", format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert_eq!(create_renderer("json", false).unwrap().file_extension(), "json");
        assert_eq!(create_renderer("json", true).unwrap().file_extension(), "json");
        assert_eq!(create_renderer("md", false).unwrap().file_extension(), "md");
        assert!(create_renderer("markdown", true).is_err());
        assert!(create_renderer("html", false).is_err());
    }
}
