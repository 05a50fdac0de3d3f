//! Port for the remote option-row table.
//!
//! The remote data service stores each model's code tables as flat rows
//! `{model_id, option_type, name, code, sort_order}`. A model's rows are
//! always replaced as a whole.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;
use crate::domain::{CodeEntry, CodeTable, OptionTable, OptionTables};

define_port_error! {
    /// Errors raised by option-row repository adapters.
    pub enum OptionRowRepositoryError {
        /// The remote service could not be reached.
        Connection { message: String } =>
            "option row repository connection failed: {message}",
        /// The remote service rejected the operation.
        Query { message: String } =>
            "option row repository query failed: {message}",
    }
}

/// One remote option row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRow {
    /// Owning model.
    pub model_id: String,
    /// `process`, `part`, `defect_cause` or `worker`.
    pub option_type: String,
    /// Entry name.
    pub name: String,
    /// Entry code.
    pub code: String,
    /// Position within the table.
    pub sort_order: u32,
}

impl OptionRow {
    /// Flatten a model's tables into rows numbered per table.
    #[must_use]
    pub fn from_tables(model_id: &str, tables: &OptionTables) -> Vec<Self> {
        OptionTable::ALL
            .into_iter()
            .flat_map(|table| {
                tables
                    .table(table)
                    .entries()
                    .iter()
                    .zip(0_u32..)
                    .map(move |(entry, sort_order)| Self {
                        model_id: model_id.to_owned(),
                        option_type: table.row_type().to_owned(),
                        name: entry.name.clone(),
                        code: entry.code.clone(),
                        sort_order,
                    })
            })
            .collect()
    }

    /// Rebuild tables from rows, ordering each table by `sort_order`.
    ///
    /// Rows with an unknown `option_type` are skipped.
    #[must_use]
    pub fn into_tables(mut rows: Vec<Self>) -> OptionTables {
        rows.sort_by_key(|row| row.sort_order);
        let mut tables = OptionTables::default();
        for table in OptionTable::ALL {
            *tables.table_mut(table) = rows
                .iter()
                .filter(|row| row.option_type == table.row_type())
                .map(|row| CodeEntry::new(row.name.as_str(), row.code.as_str()))
                .collect::<CodeTable>();
        }
        tables
    }
}

/// Remote storage of option rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OptionRowRepository: Send + Sync {
    /// Rows of one model, in any order.
    async fn list(&self, model_id: &str) -> Result<Vec<OptionRow>, OptionRowRepositoryError>;

    /// Replace every row of one model. An empty list deletes the model's rows.
    async fn replace(
        &self,
        model_id: &str,
        rows: Vec<OptionRow>,
    ) -> Result<(), OptionRowRepositoryError>;
}

/// Repository that holds no rows and accepts every replacement.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOptionRowRepository;

#[async_trait]
impl OptionRowRepository for FixtureOptionRowRepository {
    async fn list(&self, _model_id: &str) -> Result<Vec<OptionRow>, OptionRowRepositoryError> {
        Ok(Vec::new())
    }

    async fn replace(
        &self,
        _model_id: &str,
        _rows: Vec<OptionRow>,
    ) -> Result<(), OptionRowRepositoryError> {
        Ok(())
    }
}
