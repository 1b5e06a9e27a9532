//! JSON renderer: the doclet array, or the longname tree.

use anyhow::{Context, Result};
use jsdoclet_core::Processed;

use crate::render::Renderer;

pub struct JsonRenderer {
    pub tree: bool,
}

impl Renderer for JsonRenderer {
    fn render(&self, processed: &Processed) -> Result<String> {
        let mut out = if self.tree {
            serde_json::to_string_pretty(&processed.tree())
        } else {
            serde_json::to_string_pretty(&processed.doclets)
        }
        .context("failed to serialize doclets")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsdoclet_core::RunContext;
    use serde_json::Value;

    fn processed(source: &str) -> Processed {
        let mut run = RunContext::default();
        let doclets = run.parse_source(source, "lib.js").unwrap();
        jsdoclet_core::pipeline::process(doclets, &mut run.plugins)
    }

    #[test]
    fn flat_array() {
        let out = JsonRenderer { tree: false }
            .render(&processed("/** Adds. */\nfunction add(a, b) {}\n"))
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["longname"], "add");
        assert_eq!(value[0]["kind"], "function");
        assert_eq!(value[0]["description"], "Adds.");
        assert_eq!(value[0]["meta"]["filename"], "lib.js");
    }

    #[test]
    fn tree_output() {
        let out = JsonRenderer { tree: true }
            .render(&processed(
                "/** A thing. */\nclass Foo {\n  /** Runs. */\n  run() {}\n}\n",
            ))
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["global"]["Foo"]["kind"], "class");
        assert_eq!(value["global"]["Foo"]["prototype"][".run"]["longname"], "Foo#run");
    }
}
