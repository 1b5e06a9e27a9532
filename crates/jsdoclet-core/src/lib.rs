//! jsdoclet-core: extract documentation records ("doclets") from annotated
//! JavaScript sources.
//!
//! A run parses each file into an arena AST, attaches `/** */` comments to
//! the nodes they describe, walks the tree to build file-local doclets, then
//! merges, prunes, indexes and cross-links the doclets of every file.
//!
//! ```no_run
//! use jsdoclet_core::RunContext;
//!
//! let mut run = RunContext::default();
//! let processed = run.parse_files(&["src/app.js".into()])?;
//! for doclet in &processed.doclets {
//!     println!("{} ({:?})", doclet.longname(), doclet.kind);
//! }
//! # Ok::<(), jsdoclet_core::Error>(())
//! ```

pub mod ast;
pub mod attacher;
pub mod context;
pub mod descriptor;
pub mod doclet;
pub mod error;
pub mod markdown;
pub mod name;
pub mod parser;
pub mod pipeline;
pub mod plugin;
pub mod tag;
pub mod types;
pub mod walker;

pub use context::{ParserOptions, RunContext, UnknownTags};
pub use doclet::{Doclet, Kind, Param, Scope};
pub use error::{Error, Result};
pub use pipeline::{DocletIndex, DocletTree, Members, Processed};
pub use plugin::{Outcome, Plugins};
