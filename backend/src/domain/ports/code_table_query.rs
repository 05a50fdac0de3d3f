//! Driving port for reading a model's code tables.

use async_trait::async_trait;

use crate::domain::{CodeBook, DefectTypes, OptionTables};

/// Read access to per-model code tables.
///
/// Unknown models resolve to the built-in tables of the first catalogue
/// model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeTableQuery: Send + Sync {
    /// Snapshot of tables and defect types for code generation.
    async fn codebook(&self, model_id: &str) -> CodeBook;

    /// The four tables.
    async fn tables(&self, model_id: &str) -> OptionTables;

    /// The defect-type map.
    async fn defect_types(&self, model_id: &str) -> DefectTypes;
}

/// Query fixture that answers with empty tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCodeTableQuery;

#[async_trait]
impl CodeTableQuery for FixtureCodeTableQuery {
    async fn codebook(&self, _model_id: &str) -> CodeBook {
        CodeBook::default()
    }

    async fn tables(&self, _model_id: &str) -> OptionTables {
        OptionTables::default()
    }

    async fn defect_types(&self, _model_id: &str) -> DefectTypes {
        DefectTypes::default()
    }
}
