//! Error types for extraction operations.
//!
//! Only whole-document problems are errors. A value that cannot be normalized
//! or a label that resolves to no field is an empty result, not an error, so
//! nothing in this module is raised from inside the field heuristics.

use thiserror::Error;

/// Error types that can occur while extracting a record from a document.
///
/// # Examples
///
/// ```rust
/// use procura_core::{ExtractError, FieldOverride, FieldSchema, SchemaOverrides};
///
/// let mut overrides = SchemaOverrides::new();
/// overrides.insert("联系人".to_string(), FieldOverride::default());
/// match FieldSchema::with_overrides(&overrides) {
///     Err(ExtractError::Schema(msg)) => assert!(msg.contains("unknown field")),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The input could not be turned into a document tree.
    ///
    /// The batch runner counts it and moves on to the next document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A field definition or schema override is invalid.
    ///
    /// Raised while building a [`FieldSchema`](crate::FieldSchema), for
    /// instance when an override names an unknown field or carries a
    /// fallback pattern that does not compile.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Raw bytes could not be decoded into text.
    #[error("Decode error: {0}")]
    Decode(String),

    /// File I/O error while reading an input document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<regex::Error> for ExtractError {
    #[inline]
    fn from(err: regex::Error) -> Self {
        Self::Schema(err.to_string())
    }
}

/// Type alias for [`Result<T, ExtractError>`].
pub type Result<T> = std::result::Result<T, ExtractError>;
