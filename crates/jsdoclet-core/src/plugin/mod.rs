//! Lifecycle hooks.
//!
//! Each extension point holds an ordered list of handlers. Handlers run
//! synchronously in registration order and see a mutable payload; at the
//! points that insert something by default (`comment_found`,
//! `symbol_found`, `new_doclet`) any handler returning
//! [`Outcome::SuppressDefault`] stops the insertion.

pub mod react;

use std::path::PathBuf;

use crate::ast::{NodeIdx, Range};
use crate::context::ParserOptions;
use crate::doclet::{Code, Doclet, Kind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    SuppressDefault,
}

type Handler<T> = Box<dyn FnMut(&mut T) -> Outcome>;

pub struct HandlerList<T> {
    handlers: Vec<Handler<T>>,
}

impl<T> Default for HandlerList<T> {
    fn default() -> Self {
        HandlerList { handlers: Vec::new() }
    }
}

impl<T> HandlerList<T> {
    pub fn push(&mut self, handler: impl FnMut(&mut T) -> Outcome + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Run every handler. All handlers run even after one suppresses.
    pub fn emit(&mut self, payload: &mut T) -> Outcome {
        let mut outcome = Outcome::Continue;
        for handler in &mut self.handlers {
            if handler(payload) == Outcome::SuppressDefault {
                outcome = Outcome::SuppressDefault;
            }
        }
        outcome
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// -- Payloads -----------------------------------------------------------------

/// A file about to be parsed. Handlers may rewrite the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub filename: String,
    pub source: String,
}

/// The doclets one file produced, before the cross-file pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub filename: String,
    pub doclets: Vec<Doclet>,
}

/// A doc comment seen in the tree, before it is turned into doclets.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentFound {
    pub comment: String,
    pub lineno: usize,
    pub filename: String,
    pub range: Range,
}

/// A documentable code construct.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFound {
    /// `astnode<id>` of the visited node.
    pub id: String,
    /// The leading doc comment, or `@undocumented`.
    pub comment: String,
    pub lineno: usize,
    pub columnno: usize,
    pub range: Range,
    pub filename: String,
    pub node: NodeIdx,
    pub code: Code,
    /// Kind implied by the declaration form (`const`), applied when tags
    /// leave the doclet a plain member.
    pub code_kind: Option<Kind>,
}

// -- Registry -----------------------------------------------------------------

#[derive(Default)]
pub struct Plugins {
    pub parser_init: HandlerList<ParserOptions>,
    pub files_parse_begin: HandlerList<Vec<PathBuf>>,
    pub files_parse_complete: HandlerList<Vec<Doclet>>,
    pub file_parse_begin: HandlerList<SourceFile>,
    pub file_parse_complete: HandlerList<ParsedFile>,
    pub comment_found: HandlerList<CommentFound>,
    pub symbol_found: HandlerList<SymbolFound>,
    pub new_doclet: HandlerList<Doclet>,
    pub doclets_process_begin: HandlerList<Vec<Doclet>>,
    pub doclets_process_complete: HandlerList<Vec<Doclet>>,
    /// Parse `.md` files into page doclets.
    pub markdown_pages: bool,
    installed: Vec<String>,
}

impl Plugins {
    /// Install a built-in plugin by name. Unknown names are logged and
    /// skipped; installing twice is a no-op.
    pub fn install(&mut self, name: &str) -> bool {
        if self.installed.iter().any(|n| n == name) {
            return true;
        }
        match name {
            "react" => {
                self.file_parse_complete.push(|file: &mut ParsedFile| {
                    react::fold_component_props(&mut file.doclets);
                    Outcome::Continue
                });
            }
            "markdown" => self.markdown_pages = true,
            _ => {
                tracing::warn!(plugin = name, "cannot load plugin; it is not a built-in plugin");
                return false;
            }
        }
        tracing::debug!(plugin = name, "plugin installed");
        self.installed.push(name.to_string());
        true
    }

    pub fn installed(&self) -> &[String] {
        &self.installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_run_in_order_and_any_can_suppress() {
        let mut list: HandlerList<Vec<&'static str>> = HandlerList::default();
        list.push(|seen| {
            seen.push("first");
            Outcome::SuppressDefault
        });
        list.push(|seen| {
            seen.push("second");
            Outcome::Continue
        });
        let mut seen = Vec::new();
        assert_eq!(list.emit(&mut seen), Outcome::SuppressDefault);
        assert_eq!(seen, vec!["first", "second"]);
    }

    #[test]
    fn empty_list_continues() {
        let mut list: HandlerList<Doclet> = HandlerList::default();
        assert_eq!(list.emit(&mut Doclet::default()), Outcome::Continue);
    }

    #[test]
    fn install_builtins() {
        let mut plugins = Plugins::default();
        assert!(plugins.install("react"));
        assert!(plugins.install("react"));
        assert_eq!(plugins.file_parse_complete.len(), 1);
        assert!(plugins.install("markdown"));
        assert!(plugins.markdown_pages);
        assert!(!plugins.install("nope"));
        assert_eq!(plugins.installed(), ["react", "markdown"]);
    }
}
