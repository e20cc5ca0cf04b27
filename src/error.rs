use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TsxError>;

/// Error type for loading and saving tilesets.
#[derive(Debug, Error)]
pub enum TsxError {
    /// The input is not a well-formed document, or its root element is not the expected one.
    #[error("malformed document: {message}")]
    MalformedDocument {
        /// What the tokenizer (or the root check) complained about.
        message: String,
    },

    /// An attribute is present but its text cannot be coerced to the target type.
    #[error("<{element}> attribute '{attribute}' = {value:?} is not a valid {expected}")]
    MalformedAttribute {
        /// Element carrying the attribute.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Raw attribute text.
        value: String,
        /// Human readable name of the expected type.
        expected: &'static str,
    },

    /// An external tileset referenced through `source` could not be opened.
    #[error("cannot open external tileset {}: {source}", path.display())]
    UnresolvableSource {
        /// Resolved path of the referenced document.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// An object carries more than one shape marker.
    #[error("object {object_id} has conflicting shapes: {}", markers.join(", "))]
    AmbiguousObjectShape {
        /// ID of the offending object.
        object_id: u32,
        /// Names of the markers found on it.
        markers: Vec<&'static str>,
    },

    /// A chain of `source` references leads back to a document already being loaded.
    #[error("tileset source cycle through {}", path.display())]
    SourceCycle {
        /// The path that was visited twice.
        path: PathBuf,
    },

    /// Reading the input stream failed.
    #[error("failed to read tileset: {0}")]
    ReadFailure(#[source] io::Error),

    /// Writing the output stream failed.
    #[error("failed to write tileset: {0}")]
    WriteFailure(#[source] io::Error),
}

impl TsxError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        TsxError::MalformedDocument {
            message: message.into(),
        }
    }

    pub(crate) fn write_failure<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        TsxError::WriteFailure(io::Error::other(err))
    }
}
