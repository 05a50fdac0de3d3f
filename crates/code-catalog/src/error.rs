//! Error types for the code-catalog crate.
//!
//! Catalogue parsing, lookup and file updates report failures through
//! [`CatalogError`], following the project's `thiserror` conventions.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading, querying or writing a code catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalogue file could not be read.
    #[error("failed to read catalogue file at '{path}': {message}")]
    IoError {
        /// Path to the catalogue file.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The catalogue file could not be written.
    #[error("failed to write catalogue file at '{path}': {message}")]
    WriteError {
        /// Path that was being written.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The catalogue JSON is malformed or missing required fields.
    #[error("invalid catalogue JSON: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// The catalogue version is not supported.
    #[error("unsupported catalogue version: expected {expected}, found {actual}")]
    UnsupportedVersion {
        /// Expected version number.
        expected: u32,
        /// Version found in the document.
        actual: u32,
    },

    /// The catalogue declares no models.
    #[error("catalogue contains no models")]
    EmptyModels,

    /// A model is missing its identifier or product code.
    #[error("model at index {index} is invalid: {message}")]
    InvalidModel {
        /// Index of the model in the `models` array.
        index: usize,
        /// What is wrong with the model.
        message: String,
    },

    /// Two models share an identifier.
    #[error("model '{id}' is declared more than once")]
    DuplicateModel {
        /// The repeated model identifier.
        id: String,
    },

    /// A table holds two entries with the same name.
    #[error("model '{model}' table '{table}' already contains '{name}'")]
    DuplicateEntry {
        /// Model owning the table.
        model: String,
        /// Table name.
        table: String,
        /// The repeated entry name.
        name: String,
    },

    /// An entry has an empty name or code.
    #[error("model '{model}' table '{table}' contains an entry with an empty {field}")]
    BlankEntry {
        /// Model owning the table.
        model: String,
        /// Table name.
        table: String,
        /// Either `name` or `code`.
        field: &'static str,
    },

    /// The requested model was not found.
    #[error("model '{id}' not found in catalogue")]
    ModelNotFound {
        /// The model identifier that was not found.
        id: String,
    },

    /// A table name did not match any known table.
    #[error("unknown table '{value}'; expected processes, parts, defectCauses or workers")]
    UnknownTable {
        /// The unrecognised table name.
        value: String,
    },
}
