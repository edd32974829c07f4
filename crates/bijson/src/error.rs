//! The error type shared by both readers.

use std::fmt;

use thiserror::Error;

/// Location of an error inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// The location is not known.
    #[default]
    Unknown,
    /// 1-based line and column in a text document.
    Text {
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        column: usize,
    },
    /// Byte offset in a binary document.
    Offset(usize),
}

/// The kind of failure, also used to decide recoverability.
///
/// `TypeMismatch` and `NumericOverflow` leave the reader in a usable state;
/// every other kind is either fatal to the current read or, for JSON syntax
/// errors, latches the reader so that further navigation fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A byte or token that cannot appear at the current position.
    #[error("{0}")]
    UnexpectedToken(String),
    /// End of input inside a token, a length-prefixed payload or an
    /// unterminated container.
    #[error("{0}")]
    TruncatedInput(String),
    /// The value parsed successfully but does not fit the requested type.
    #[error("{0}")]
    NumericOverflow(String),
    /// Bytes that do not decode as the detected character encoding.
    #[error("{0}")]
    InvalidEncoding(String),
    /// An operation that is not meaningful in the current reader state.
    #[error("{0}")]
    Misuse(String),
    /// The current value cannot be read as the requested type.
    #[error("{0}")]
    TypeMismatch(String),
    /// A byte outside the Base64 alphabet.
    #[error("invalid Base64 character: '{0}'")]
    InvalidBase64(char),
    /// The content sniffer did not recognize the input as JSON or UBJSON.
    #[error("{0}")]
    UnknownContent(String),
    /// An I/O error from the underlying source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error raised by tokenizers, readers and the materializing tree.
///
/// Rendered as `"On line L, column C: message"` for text documents and
/// `"At offset O: message"` for binary ones, prefixed with the document file
/// name when one is known.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    position: Position,
    file_name: Option<String>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, position: Position) -> Self {
        Error {
            kind,
            position,
            file_name: None,
        }
    }

    /// The kind of failure.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Where the failure occurred, when known.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The document file name, when the reader was constructed from a file.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Whether the reader remains usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::TypeMismatch(_) | ErrorKind::NumericOverflow(_)
        )
    }

    pub(crate) fn with_position(mut self, position: Position) -> Self {
        if self.position == Position::Unknown {
            self.position = position;
        }
        self
    }

    pub(crate) fn with_file_name(mut self, file_name: Option<&str>) -> Self {
        if self.file_name.is_none() {
            self.file_name = file_name.map(str::to_owned);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.file_name {
            write!(f, "{name}: ")?;
        }
        match self.position {
            Position::Unknown => {}
            Position::Text { line, column } => {
                write!(f, "On line {line}, column {column}: ")?;
            }
            Position::Offset(offset) => write!(f, "At offset {offset}: ")?,
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind, Position::Unknown)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error), Position::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_text_position() {
        let error = Error::new(
            ErrorKind::UnexpectedToken("unexpected ','".into()),
            Position::Text { line: 3, column: 7 },
        );
        assert_eq!(error.to_string(), "On line 3, column 7: unexpected ','");
    }

    #[test]
    fn renders_offset_and_file_name() {
        let error = Error::new(
            ErrorKind::TruncatedInput("unexpected end of document".into()),
            Position::Offset(12),
        )
        .with_file_name(Some("data.ubj"));
        assert_eq!(
            error.to_string(),
            "data.ubj: At offset 12: unexpected end of document"
        );
    }

    #[test]
    fn recoverability() {
        let mismatch = Error::from(ErrorKind::TypeMismatch("not a string".into()));
        assert!(mismatch.is_recoverable());
        let syntax = Error::from(ErrorKind::UnexpectedToken("unexpected '}'".into()));
        assert!(!syntax.is_recoverable());
    }
}
