//! Built-in code tables for quality defect coding.
//!
//! This crate owns the versioned JSON catalogue that seeds each product model
//! with its default processes, parts, defect causes, workers and per-category
//! defect-type digits. It is independent of backend domain types so the
//! catalogue can be edited and validated offline.
//!
//! # Example
//!
//! ```
//! use code_catalog::{CatalogTable, CodeCatalog};
//!
//! let catalog = CodeCatalog::builtin();
//! let defaults = catalog.defaults_for("EP-7000");
//!
//! assert_eq!(defaults.product_code(), "E07");
//! assert_eq!(defaults.table(CatalogTable::Workers).len(), 5);
//! ```

mod atomic_io;
mod catalog;
pub mod entry_cli;
mod error;

pub use catalog::{CatalogEntry, CatalogTable, CodeCatalog, DefectTypeMap, ModelDefaults};
pub use error::CatalogError;
