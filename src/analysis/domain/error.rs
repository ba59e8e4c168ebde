//! Error types for analysis taxonomy parsing and label mapping.

use thiserror::Error;

/// A model emitted a label that has no entry in the translation table.
///
/// This error is never fatal: callers map the label onto the taxonomy's
/// fallback value and keep going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized {taxonomy} label from model: '{label}'")]
pub struct UnknownLabelError {
    /// Taxonomy the label was looked up in.
    pub taxonomy: &'static str,
    /// Label as emitted by the model.
    pub label: String,
}

/// Error returned while parsing canonical taxonomy names from storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {taxonomy} value: {value}")]
pub struct ParseTaxonomyError {
    /// Taxonomy being parsed.
    pub taxonomy: &'static str,
    /// Rejected input.
    pub value: String,
}
