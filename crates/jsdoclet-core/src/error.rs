//! Error types for doclet extraction.

use std::path::PathBuf;

/// Errors surfaced by the extraction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source text could not be parsed. Non-fatal: the file is skipped.
    #[error("unable to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// The syntax tree contained a construct the adapter has no mapping for.
    #[error("unknown node kind `{kind}` at line {line}")]
    UnknownNodeKind { kind: String, line: usize },

    #[error("The scope name \"{scope}\" is not recognized. Use one of the following values: {allowed}. File: {file}")]
    InvalidScope {
        scope: String,
        allowed: String,
        file: String,
    },

    #[error("Invalid type expression \"{expression}\": {message}")]
    InvalidType { expression: String, message: String },

    #[error("failed to load the JavaScript grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Fatal errors abort the whole run rather than skipping a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::UnknownNodeKind { .. } | Error::Language(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_recoverable() {
        let err = Error::Parse {
            file: "a.js".into(),
            message: "unexpected token".into(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "unable to parse a.js: unexpected token");
    }

    #[test]
    fn unknown_node_kind_is_fatal() {
        let err = Error::UnknownNodeKind {
            kind: "decorator_call".into(),
            line: 3,
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn invalid_scope_message() {
        let err = Error::InvalidScope {
            scope: "outer".into(),
            allowed: "global, inner, instance, static".into(),
            file: "a.js".into(),
        };
        assert!(err.to_string().starts_with("The scope name \"outer\""));
    }
}
