//! Error types for powerbase.

use thiserror::Error;

/// The main error type for powerbase operations.
///
/// Every variant is fatal for the invocation that raised it. Nothing in the
/// crate retries.
#[derive(Debug, Error)]
pub enum PowerbaseError {
    /// A required setting is absent from the environment.
    #[error("Missing configuration: {0}")]
    MissingSetting(&'static str),

    /// A boolean setting holds something other than `true` or `false`.
    #[error("Expected type \"boolean\" for setting \"{key}\", found \"{found}\"")]
    InvalidBool { key: &'static str, found: String },

    /// A numeric setting does not parse as a number.
    #[error("Expected type \"number\" for setting \"{key}\", found \"{found}\"")]
    InvalidNumber { key: &'static str, found: String },

    /// `TAB_SIZE` below zero.
    #[error("Setting \"TAB_SIZE\" must be a non-negative number, found {0}")]
    NegativeTabSize(f64),

    /// `TAB_SIZE` too large to indent with.
    #[error("Setting \"TAB_SIZE\" must be at most {max}, found {found}")]
    TabSizeTooLarge { max: usize, found: f64 },

    /// Input contains neither `select` nor `from`.
    #[error("No SQL statement found in {preview}...")]
    NoSql { preview: String },

    /// Dialect markers matched both dialects, or neither.
    #[error("Ambiguous encoding detected: {0}")]
    Ambiguous(&'static str),

    /// Clipboard read or write failed.
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Broad failure category, used when reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Detection,
    Io,
}

impl PowerbaseError {
    /// Create a no-SQL error, keeping the first 30 characters of the input.
    pub fn no_sql(input: &str) -> Self {
        Self::NoSql {
            preview: input.chars().take(30).collect(),
        }
    }

    /// Create a clipboard error from any displayable cause.
    pub fn clipboard(cause: impl std::fmt::Display) -> Self {
        Self::Clipboard(cause.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSetting(_)
            | Self::InvalidBool { .. }
            | Self::InvalidNumber { .. }
            | Self::NegativeTabSize(_)
            | Self::TabSizeTooLarge { .. } => ErrorKind::Config,
            Self::NoSql { .. } | Self::Ambiguous(_) => ErrorKind::Detection,
            Self::Clipboard(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for powerbase operations.
pub type PowerbaseResult<T> = Result<T, PowerbaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PowerbaseError::InvalidBool {
            key: "USE_SPACES",
            found: "yes".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Expected type \"boolean\" for setting \"USE_SPACES\", found \"yes\""
        );
    }

    #[test]
    fn test_no_sql_preview_is_truncated() {
        let err = PowerbaseError::no_sql("the quick brown fox jumps over the lazy dog");
        assert_eq!(
            err.to_string(),
            "No SQL statement found in the quick brown fox jumps over...",
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(PowerbaseError::MissingSetting("DB_HOST").kind(), ErrorKind::Config);
        assert_eq!(PowerbaseError::NegativeTabSize(-1.0).kind(), ErrorKind::Config);
        assert_eq!(PowerbaseError::no_sql("").kind(), ErrorKind::Detection);
        assert_eq!(PowerbaseError::Ambiguous("x").kind(), ErrorKind::Detection);
        assert_eq!(PowerbaseError::clipboard("denied").kind(), ErrorKind::Io);
    }
}
