use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading a series or running a query against it.
///
/// None of these leave a loaded [`Series`](crate::Series) in a modified state:
/// a failed query can be followed by further queries on the same series.
#[derive(Error, Debug)]
pub enum Error {
    /// The series source is malformed or truncated. Loading is aborted.
    #[error("format error: {0}")]
    Format(String),

    /// A window addressed observations outside the series.
    #[error("range error: [{offset}, {offset}+{length}) is outside a series of {len} observations")]
    Range {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// A query parameter violated its precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A scan was stopped through its [`CancelFlag`](crate::CancelFlag).
    #[error("scan cancelled")]
    Cancelled,

    /// Underlying I/O failure (open, write, non-truncation read error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn range(offset: usize, length: usize, len: usize) -> Self {
        Error::Range {
            offset,
            length,
            len,
        }
    }

    /// Short name of the error kind, for CLI reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Format(_) => "FormatError",
            Error::Range { .. } => "RangeError",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Cancelled => "Cancelled",
            Error::Io(_) => "IoError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_message() {
        let e = Error::range(10, 5, 12);
        assert_eq!(
            e.to_string(),
            "range error: [10, 10+5) is outside a series of 12 observations"
        );
        assert_eq!(e.kind(), "RangeError");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: Error = io.into();
        assert_eq!(e.kind(), "IoError");
    }
}
