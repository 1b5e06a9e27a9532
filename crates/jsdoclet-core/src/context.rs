//! Per-run state: node ids, parser options and plugins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::doclet::Doclet;
use crate::error::{Error, Result};
use crate::markdown;
use crate::parser;
use crate::pipeline::{self, Processed};
use crate::plugin::{ParsedFile, Plugins, SourceFile};

/// Extensions parsed as JavaScript.
pub const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Node ids handed out during one run. Ids never repeat across the files
/// of a run.
#[derive(Debug, Clone)]
pub struct NodeIdSeq {
    next: u64,
}

impl Default for NodeIdSeq {
    fn default() -> Self {
        NodeIdSeq { next: 100_000_000 }
    }
}

impl NodeIdSeq {
    pub fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// How tags missing from the dictionary are treated: all tolerated, none
/// tolerated, or only the listed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnknownTags {
    Flag(bool),
    List(Vec<String>),
}

impl Default for UnknownTags {
    fn default() -> Self {
        UnknownTags::Flag(true)
    }
}

impl UnknownTags {
    pub fn tolerates(&self, title: &str) -> bool {
        match self {
            UnknownTags::Flag(allowed) => *allowed,
            UnknownTags::List(names) => names.iter().any(|n| n == title),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserOptions {
    #[serde(rename = "allowUnknownTags", default)]
    pub unknown_tags: UnknownTags,
}

/// Everything one extraction run owns. Runs never share state.
pub struct RunContext {
    pub ids: NodeIdSeq,
    pub options: ParserOptions,
    pub plugins: Plugins,
}

impl RunContext {
    pub fn new(mut options: ParserOptions, mut plugins: Plugins) -> Self {
        plugins.parser_init.emit(&mut options);
        RunContext {
            ids: NodeIdSeq::default(),
            options,
            plugins,
        }
    }

    /// Parse one source text into its file-local doclets.
    pub fn parse_source(&mut self, source: &str, file: &str) -> Result<Vec<Doclet>> {
        let mut begin = SourceFile {
            filename: file.to_string(),
            source: source.to_string(),
        };
        self.plugins.file_parse_begin.emit(&mut begin);

        let doclets = if is_markdown(Path::new(file)) {
            markdown::parse_page(&begin.source, file).into_iter().collect()
        } else {
            parser::parse_js(
                &begin.source,
                file,
                &mut self.ids,
                &self.options.unknown_tags,
                &mut self.plugins,
            )?
        };

        let mut complete = ParsedFile {
            filename: file.to_string(),
            doclets,
        };
        self.plugins.file_parse_complete.emit(&mut complete);
        debug!(file, doclets = complete.doclets.len(), "file parsed");
        Ok(complete.doclets)
    }

    /// Read and parse one file. Files of an unsupported type yield nothing.
    pub fn parse_file(&mut self, path: &Path) -> Result<Vec<Doclet>> {
        if !self.accepts(path) {
            debug!(path = %path.display(), "skipping unsupported file");
            return Ok(Vec::new());
        }
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_source(&source, &path.to_string_lossy())
    }

    /// Whether `path` is a file this run knows how to parse.
    pub fn accepts(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        JS_EXTENSIONS.contains(&ext) || (self.plugins.markdown_pages && ext == "md")
    }

    /// Parse every file and run the cross-file pipeline over the result.
    /// A file that fails to read or parse is logged and skipped; fatal
    /// errors abort the run.
    pub fn parse_files(&mut self, files: &[PathBuf]) -> Result<Processed> {
        let mut files = files.to_vec();
        self.plugins.files_parse_begin.emit(&mut files);

        let mut doclets = Vec::new();
        let mut parsed = 0usize;
        for path in &files {
            match self.parse_file(path) {
                Ok(found) => {
                    parsed += 1;
                    doclets.extend(found);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => error!("{err}"),
            }
        }

        self.plugins.files_parse_complete.emit(&mut doclets);
        info!(files = parsed, doclets = doclets.len(), "finished parsing source files");
        Ok(pipeline::process(doclets, &mut self.plugins))
    }
}

impl Default for RunContext {
    fn default() -> Self {
        RunContext::new(ParserOptions::default(), Plugins::default())
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Outcome;
    use std::io::Write;

    #[test]
    fn ids_are_monotonic() {
        let mut ids = NodeIdSeq::default();
        let first = ids.next_id();
        assert!(ids.next_id() > first);
    }

    #[test]
    fn unknown_tags_from_json() {
        let opts: ParserOptions =
            serde_json::from_str(r#"{"allowUnknownTags": ["frob"]}"#).unwrap();
        assert!(opts.unknown_tags.tolerates("frob"));
        assert!(!opts.unknown_tags.tolerates("other"));

        let opts: ParserOptions = serde_json::from_str(r#"{"allowUnknownTags": false}"#).unwrap();
        assert!(!opts.unknown_tags.tolerates("frob"));

        let opts: ParserOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.unknown_tags.tolerates("anything"));
    }

    #[test]
    fn parser_init_sees_options() {
        let mut plugins = Plugins::default();
        plugins.parser_init.push(|opts: &mut ParserOptions| {
            opts.unknown_tags = UnknownTags::Flag(false);
            Outcome::Continue
        });
        let ctx = RunContext::new(ParserOptions::default(), plugins);
        assert_eq!(ctx.options.unknown_tags, UnknownTags::Flag(false));
    }

    #[test]
    fn file_begin_can_rewrite_source() {
        let mut plugins = Plugins::default();
        plugins.file_parse_begin.push(|file: &mut SourceFile| {
            file.source = "/** Replaced. */\nfunction swapped() {}\n".to_string();
            Outcome::Continue
        });
        let mut ctx = RunContext::new(ParserOptions::default(), plugins);
        let doclets = ctx.parse_source("function original() {}", "a.js").unwrap();
        assert!(doclets.iter().any(|d| d.longname() == "swapped"));
        assert!(!doclets.iter().any(|d| d.longname() == "original"));
    }

    #[test]
    fn parse_files_skips_unreadable_and_unsupported() {
        let dir = std::env::temp_dir().join(format!("jsdoclet-ctx-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.js");
        let mut f = std::fs::File::create(&good).unwrap();
        writeln!(f, "/** Adds. */\nfunction add(a, b) {{}}").unwrap();
        let notes = dir.join("notes.txt");
        std::fs::write(&notes, "not code").unwrap();

        let mut ctx = RunContext::default();
        let processed = ctx
            .parse_files(&[good.clone(), dir.join("missing.js"), notes.clone()])
            .unwrap();
        let names: Vec<&str> = processed.doclets.iter().map(|d| d.longname()).collect();
        assert_eq!(names, vec!["add"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn markdown_needs_the_plugin() {
        let mut ctx = RunContext::default();
        assert!(!ctx.accepts(Path::new("a.md")));
        ctx.plugins.install("markdown");
        assert!(ctx.accepts(Path::new("a.md")));
        let doclets = ctx.parse_source("!@name intro\n---\nHi\n", "intro.md").unwrap();
        assert_eq!(doclets.len(), 1);
        assert_eq!(doclets[0].name(), "intro");
    }
}
