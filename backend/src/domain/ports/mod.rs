//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`KeyValueStore`, `OptionRowRepository`,
//! `SubmissionRepository`) are implemented by outbound adapters. Driving
//! ports (`CodeTableCommand`, `CodeTableQuery`, `ModelCatalog`,
//! `SubmissionCommand`, `SubmissionQuery`) are implemented by domain services
//! and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod code_table_command;
mod code_table_query;
mod key_value_store;
mod model_catalog;
mod option_row_repository;
mod submission_command;
mod submission_query;
mod submission_repository;

#[cfg(test)]
pub use code_table_command::MockCodeTableCommand;
pub use code_table_command::{CodeTableCommand, FixtureCodeTableCommand};
#[cfg(test)]
pub use code_table_query::MockCodeTableQuery;
pub use code_table_query::{CodeTableQuery, FixtureCodeTableQuery};
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{
    FixtureKeyValueStore, KeyValueStore, KeyValueStoreError, get_json, put_json,
};
#[cfg(test)]
pub use model_catalog::MockModelCatalog;
pub use model_catalog::{FixtureModelCatalog, ModelCatalog, ModelList};
#[cfg(test)]
pub use option_row_repository::MockOptionRowRepository;
pub use option_row_repository::{
    FixtureOptionRowRepository, OptionRow, OptionRowRepository, OptionRowRepositoryError,
};
#[cfg(test)]
pub use submission_command::MockSubmissionCommand;
pub use submission_command::{FixtureSubmissionCommand, SubmissionCommand};
#[cfg(test)]
pub use submission_query::MockSubmissionQuery;
pub use submission_query::{FixtureSubmissionQuery, SubmissionQuery};
#[cfg(test)]
pub use submission_repository::MockSubmissionRepository;
pub use submission_repository::{
    FixtureSubmissionRepository, InvalidWorkDate, SubmissionRepository,
    SubmissionRepositoryError, SubmissionRow,
};
