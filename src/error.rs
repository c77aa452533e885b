use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the catenator library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Directory traversal error.
    #[error("Failed to walk directory tree: {message}")]
    Walk {
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Ignore pattern that cannot be compiled.
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Invalid UTF-8 encountered in a file selected for output.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// Token counting was requested but the tokenizer is not available.
    #[error("Tokenizer '{tokenizer}' is unavailable: {reason}")]
    TokenizerUnavailable {
        /// Encoding identifier
        tokenizer: String,
        /// Why it could not be provided
        reason: String,
    },

    /// System clipboard could not be accessed.
    #[error("Clipboard error: {message}")]
    Clipboard {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates a tokenizer-unavailable error.
    #[must_use]
    pub fn tokenizer_unavailable(tokenizer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TokenizerUnavailable {
            tokenizer: tokenizer.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if the tokenizer could not be provided.
    #[must_use]
    pub const fn is_tokenizer_unavailable(&self) -> bool {
        matches!(self, Self::TokenizerUnavailable { .. })
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        match e.path() {
            Some(path) => Self::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            None => Self::Walk {
                message: e.to_string(),
            },
        }
    }
}

impl From<arboard::Error> for Error {
    fn from(e: arboard::Error) -> Self {
        Self::Clipboard {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_invalid_pattern_message() {
        let err = Error::invalid_pattern("[abc", "unclosed character class");
        assert!(err.to_string().contains("[abc"));
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn test_tokenizer_unavailable() {
        let err = Error::tokenizer_unavailable("cl100k_base", "please install tiktoken");
        assert!(err.is_tokenizer_unavailable());
        assert!(err.to_string().contains("cl100k_base"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::invalid_utf8("bin.py");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
