//! Error types for cruise-xml

/// Result type for cruise-xml operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading markup into a tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Malformed document at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Document has more than one root element: found <{element}> after the root")]
    MultipleRoots { element: String },

    #[error("Document is not valid UTF-8")]
    Encoding,
}

impl Error {
    /// Syntax error at a byte offset of `input`.
    pub(crate) fn syntax(input: &str, offset: u64, message: impl ToString) -> Self {
        let end = usize::try_from(offset).unwrap_or(usize::MAX).min(input.len());
        let line = input.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1;
        Self::Syntax {
            line,
            message: message.to_string(),
        }
    }
}
