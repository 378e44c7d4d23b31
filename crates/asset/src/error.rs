//! Parse failures shared by the OBJ and MTL parsers.
//!
//! Every variant carries the 1-based line number and the raw line text. A
//! failure aborts the whole parse: pool indices are cumulative, so skipping a
//! bad line would shift every later reference.

use thiserror::Error;

use crate::obj::FaceLayout;

/// Why a single vertex reference could not be resolved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("references are 1-based, 0 is not a valid reference")]
    Zero,
    #[error("reference {reference} resolves outside a pool of {len} elements")]
    OutOfRange { reference: i64, len: usize },
    #[error("'{0}' is not an integer reference")]
    NotANumber(String),
}

/// Why a face record was rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FaceError {
    #[error("a face needs at least 3 references, found {0}")]
    TooFewReferences(usize),
    #[error("reference '{0}' does not match any known layout")]
    UnrecognizedReference(String),
    #[error("reference layout {found:?} differs from the file's layout {expected:?}")]
    LayoutMismatch {
        expected: FaceLayout,
        found: FaceLayout,
    },
    #[error("geometry exceeds {} vertices", u32::MAX)]
    TooManyVertices,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: malformed reference in '{text}': {source}")]
    MalformedReference {
        line: usize,
        text: String,
        source: ReferenceError,
    },
    #[error("line {line}: malformed face '{text}': {reason}")]
    MalformedFace {
        line: usize,
        text: String,
        reason: FaceError,
    },
    #[error("line {line}: material property before any 'newmtl': '{text}'")]
    MaterialBeforeDeclaration { line: usize, text: String },
    #[error("line {line}: malformed number in '{text}'")]
    MalformedNumber { line: usize, text: String },
}

impl ParseError {
    /// 1-based line the failure was raised on.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedReference { line, .. }
            | ParseError::MalformedFace { line, .. }
            | ParseError::MaterialBeforeDeclaration { line, .. }
            | ParseError::MalformedNumber { line, .. } => *line,
        }
    }

    /// Raw text of the offending line.
    pub fn text(&self) -> &str {
        match self {
            ParseError::MalformedReference { text, .. }
            | ParseError::MalformedFace { text, .. }
            | ParseError::MaterialBeforeDeclaration { text, .. }
            | ParseError::MalformedNumber { text, .. } => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_and_text() {
        let err = ParseError::MalformedFace {
            line: 7,
            text: "f 1 2".to_string(),
            reason: FaceError::TooFewReferences(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("f 1 2"));
        assert_eq!(err.line(), 7);
        assert_eq!(err.text(), "f 1 2");
    }
}
