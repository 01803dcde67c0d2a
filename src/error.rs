//! Custom error types for the application.
//!
//! `MapError` is the single error type returned by the library's fallible operations.
//! It separates the two families of failures the viewer distinguishes:
//!
//! - **Resource errors** (`ColorMapIo`, `ColorMapEmpty`, `MontageIo`, `MontageFormat`,
//!   `MontageWrite`): a file the operator pointed at could not be read, parsed, or written.
//!   The viewer recovers from these at the boundary (generated color table, empty montage)
//!   and reports them once through the notice board.
//! - **Setup errors** (`Amplifier`, `Config`, `Configuration`): the device or the
//!   configuration is unusable. Amplifier failures disable live readings only; configuration
//!   failures stop the binary before a window is opened.
//!
//! Input-format problems (a non-numeric channel typed into an edit field) and montage
//! entries naming electrodes that do not exist are deliberately *not* errors and never
//! reach this type.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type MapResult<T> = std::result::Result<T, MapError>;

/// Errors surfaced by the library.
#[derive(Error, Debug)]
pub enum MapError {
    /// The color table file could not be read.
    #[error("Cannot read color map '{}': {source}", path.display())]
    ColorMapIo {
        /// File that was read.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The color table file has no rows.
    #[error("Color map '{}' contains no rows", path.display())]
    ColorMapEmpty {
        /// File that was read.
        path: PathBuf,
    },

    /// The montage file could not be read.
    #[error("Cannot read montage '{}': {source}", path.display())]
    MontageIo {
        /// File that was read.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The montage JSON is malformed.
    #[error("Montage is not a valid electrode mapping: {0}")]
    MontageFormat(#[from] serde_json::Error),

    /// The montage file could not be written.
    #[error("Cannot write montage '{}': {source}", path.display())]
    MontageWrite {
        /// File that was written.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The amplifier failed to come up.
    #[error("Amplifier error: {0}")]
    Amplifier(String),

    /// Settings could not be extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Settings were extracted but are not usable.
    #[error("Configuration validation error: {0}")]
    Configuration(String),
}

impl MapError {
    /// Whether the viewer can keep running after this error.
    ///
    /// Everything except configuration problems has a safe fallback.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MapError::Config(_) | MapError::Configuration(_))
    }
}

impl From<figment::Error> for MapError {
    fn from(value: figment::Error) -> Self {
        MapError::Config(Box::new(value))
    }
}
