//! Error types for Rasterband.
//!
//! Uses thiserror for structured errors with context. Every error is terminal
//! for the current run:
//! - configuration problems surface before any pixel is touched
//! - format and I/O problems carry the offending path

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Rasterband.
///
/// This enum encompasses all error categories and enables automatic
/// conversion from the more specific error types.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported pixel format {color_type} in '{}'", path.display())]
    UnsupportedFormat { path: PathBuf, color_type: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image must have a non-zero size, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors from filter selection and run configuration.
///
/// These are raised while setting up a run and are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown filter '{name}'")]
    UnknownFilter { name: String },

    #[error("Filter '{filter}' requires {expected}")]
    MissingArgument { filter: String, expected: String },

    #[error("Invalid value '{value}' for argument '{argument}' of filter '{filter}': {reason}")]
    InvalidArgument {
        filter: String,
        argument: String,
        value: String,
        reason: String,
    },

    #[error("Filter not set")]
    FilterNotSet,

    #[error("Invalid option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("Failed to read config file '{}': {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },
}

impl ConfigError {
    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ConfigError::UnknownFilter { .. } => {
                Some("Run 'rasterband list' to see the available filters".to_string())
            }
            ConfigError::MissingArgument { filter, .. } => Some(format!(
                "Run 'rasterband info {}' to see its arguments",
                filter
            )),
            ConfigError::InvalidArgument { argument, reason, .. } => {
                Some(format!("Adjust '{}': {}", argument, reason))
            }
            ConfigError::FilterNotSet => Some("Select a filter with -f <name>".to_string()),
            _ => None,
        }
    }
}

/// Result type alias for Rasterband operations.
pub type RasterResult<T> = Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let error: RasterError = ConfigError::FilterNotSet.into();
        assert!(matches!(error, RasterError::Config(ConfigError::FilterNotSet)));
        assert_eq!(error.to_string(), "Configuration error: Filter not set");
    }

    #[test]
    fn test_missing_argument_message() {
        let error = ConfigError::MissingArgument {
            filter: "spot".to_string(),
            expected: "x, y, radius".to_string(),
        };
        assert_eq!(error.to_string(), "Filter 'spot' requires x, y, radius");
        assert!(error.suggested_fix().unwrap().contains("info spot"));
    }

    #[test]
    fn test_io_error_carries_path() {
        let error = RasterError::Io {
            path: PathBuf::from("/tmp/missing.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(error.to_string().contains("/tmp/missing.png"));
    }
}
