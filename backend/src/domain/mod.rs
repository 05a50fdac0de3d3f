//! Domain primitives, engines and services.
//!
//! Purpose: define the quality-dashboard entities (code tables, defect
//! codes, submissions, statistics and product models), the pure engines that
//! work on them, and the services that implement the driving ports in
//! [`ports`]. Nothing here depends on actix or on a concrete adapter.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — transport-agnostic error payload.
//! - CodeTable / OptionTables — ordered name-to-code tables per model.
//! - DefectTypes — per-category defect-type digits.
//! - generate / generate_from_codes / generate_batch — defect code builder.
//! - WorkerSubmission / SubmissionDraft — recorded and unvalidated inputs.
//! - aggregate / SubmissionStats — the statistics engine.
//! - ModelCatalogue — the never-empty list of product models.
//! - CodeTableRegistry, SubmissionService, ModelCatalogService — services.

pub mod code_table;
pub mod code_table_service;
pub mod defect_code;
pub mod defect_types;
pub mod error;
pub mod model_catalog_service;
pub mod models;
pub mod persistence;
pub mod ports;
pub mod stats;
pub mod submission;
pub mod submission_service;
pub mod trace_id;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::code_table::{
    CodeEntry, CodeTable, OptionTable, OptionTables, UnknownOptionTable,
};
pub use self::code_table_service::CodeTableRegistry;
pub use self::defect_code::{
    CodeBook, CodeBreakdown, DefectCode, DefectObservation, UNKNOWN_DEFECT, UNKNOWN_PART,
    UNKNOWN_PROCESS, generate, generate_batch, generate_from_codes,
};
pub use self::defect_types::{CategoryDefects, DefectTypes};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::model_catalog_service::ModelCatalogService;
pub use self::models::{ModelCatalogue, ModelConfig, ModelConfigError};
pub use self::persistence::{
    Persisted, PersistenceTarget, PersistenceWarning, RefreshOutcome, keys,
};
pub use self::stats::{
    DailyTrendPoint, DateRange, PartStats, ProcessStats, RankedCount, StatFilters,
    SubmissionStats, WorkerStats, aggregate, shift_date,
};
pub use self::submission::{
    DATE_FORMAT, DailySummary, DefectEntry, DraftDefect, LEGACY_MODEL_ID, SubmissionDraft,
    SubmissionValidationError, ValidSubmission, WorkerSubmission, normalize_date,
    parse_work_date,
};
pub use self::submission_service::SubmissionService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use quality_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::not_found("no such model"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
