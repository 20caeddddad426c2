//! Purpose: Single error type shared by the library service, HTTP adapter, and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Explicit result kinds instead of exception-style control flow.
//! Invariants: Validation failures carry the exact client-facing message.
//! Invariants: Exit codes per kind are stable once published.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    InvalidInput,
    DuplicateEntry,
    NotFound,
    Io,
}

impl ErrorKind {
    /// True for kinds produced by request validation (surfaced as HTTP 400).
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidInput | ErrorKind::DuplicateEntry | ErrorKind::NotFound
        )
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub(crate) fn invalid_title() -> Self {
        Self::new(ErrorKind::InvalidInput).with_message("Invalid book title")
    }

    pub(crate) fn invalid_titles() -> Self {
        Self::new(ErrorKind::InvalidInput).with_message("Invalid book titles")
    }

    pub(crate) fn duplicate_title() -> Self {
        Self::new(ErrorKind::DuplicateEntry).with_message("Duplicate book title")
    }

    pub(crate) fn book_not_found() -> Self {
        Self::new(ErrorKind::NotFound).with_message("Book not found")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::InvalidInput => 3,
        ErrorKind::DuplicateEntry => 4,
        ErrorKind::NotFound => 5,
        ErrorKind::Io => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::InvalidInput, 3),
            (ErrorKind::DuplicateEntry, 4),
            (ErrorKind::NotFound, 5),
            (ErrorKind::Io, 6),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn validation_errors_carry_client_messages() {
        assert_eq!(Error::invalid_title().message(), Some("Invalid book title"));
        assert_eq!(Error::invalid_titles().message(), Some("Invalid book titles"));
        assert_eq!(Error::duplicate_title().message(), Some("Duplicate book title"));
        assert_eq!(Error::book_not_found().message(), Some("Book not found"));
        assert!(Error::book_not_found().kind().is_validation());
        assert!(!ErrorKind::Internal.is_validation());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = Error::new(ErrorKind::Usage).with_message("bad flag");
        assert_eq!(err.to_string(), "Usage: bad flag");
    }
}
