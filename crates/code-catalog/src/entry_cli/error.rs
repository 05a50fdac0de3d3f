//! Error types for the catalogue entry CLI.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::error::CatalogError;

/// Errors surfaced by the CLI update flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// The catalogue path has no parent directory or file name.
    #[error("catalogue path '{path}' must name a file")]
    InvalidCatalogPath {
        /// The rejected path.
        path: Utf8PathBuf,
    },
    /// The directory holding the catalogue could not be opened.
    #[error("failed to open catalogue directory '{path}': {message}")]
    OpenDirectory {
        /// Directory path.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },
    /// An error occurred while reading or writing the catalogue.
    #[error("catalogue error: {source}")]
    Catalog {
        /// Underlying catalogue error.
        #[from]
        #[source]
        source: CatalogError,
    },
}
