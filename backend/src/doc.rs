//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the request, response and domain schemas they reference. The
//! document is served by Swagger UI in debug builds and printed by
//! `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::domain::{
    CodeBreakdown, CodeEntry, CodeTable, DailySummary, DailyTrendPoint, DateRange, DefectCode,
    DefectEntry, DefectObservation, DefectTypes, DraftDefect, Error, ErrorCode, ModelConfig,
    OptionTable, OptionTables, PartStats, PersistenceTarget, PersistenceWarning, ProcessStats,
    RankedCount, SubmissionDraft, SubmissionStats, WorkerStats, WorkerSubmission,
};
use crate::domain::ports::ModelList;
use crate::inbound::http::defect_codes::{
    GenerateCodesRequest, GenerateResolvedRequest, GeneratedCodes, ResolvedObservation,
};
use crate::inbound::http::defect_types::{
    CategoryNames, DefectTypesResponse, UpsertDefectTypeRequest,
};
use crate::inbound::http::models::{AddModelRequest, ModelResponse, SelectModelRequest};
use crate::inbound::http::options::{AddEntryRequest, TablesResponse};
use crate::inbound::http::stats::{RangePreset, RankedWorker, Rankings, StatsResponse};
use crate::inbound::http::submissions::{DailySummaryResponse, SubmissionResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quality dashboard API",
        description = "Code tables, defect code generation, worker submissions and defect statistics per product model."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::models::list_models,
        crate::inbound::http::models::add_model,
        crate::inbound::http::models::remove_model,
        crate::inbound::http::models::select_model,
        crate::inbound::http::options::get_options,
        crate::inbound::http::options::reset_options,
        crate::inbound::http::options::add_option,
        crate::inbound::http::options::remove_option,
        crate::inbound::http::defect_types::get_defect_types,
        crate::inbound::http::defect_types::get_category_names,
        crate::inbound::http::defect_types::reset_defect_types,
        crate::inbound::http::defect_types::upsert_defect_type,
        crate::inbound::http::defect_types::remove_defect_type,
        crate::inbound::http::defect_codes::generate_codes,
        crate::inbound::http::defect_codes::generate_resolved_codes,
        crate::inbound::http::submissions::list_submissions,
        crate::inbound::http::submissions::add_submission,
        crate::inbound::http::submissions::daily_summary,
        crate::inbound::http::submissions::delete_submission,
        crate::inbound::http::stats::get_stats,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        PersistenceTarget,
        PersistenceWarning,
        ModelConfig,
        ModelList,
        AddModelRequest,
        SelectModelRequest,
        ModelResponse,
        CodeEntry,
        CodeTable,
        OptionTable,
        OptionTables,
        AddEntryRequest,
        TablesResponse,
        DefectTypes,
        UpsertDefectTypeRequest,
        DefectTypesResponse,
        CategoryNames,
        DefectObservation,
        ResolvedObservation,
        GenerateCodesRequest,
        GenerateResolvedRequest,
        GeneratedCodes,
        DefectCode,
        CodeBreakdown,
        SubmissionDraft,
        DraftDefect,
        DefectEntry,
        WorkerSubmission,
        SubmissionResponse,
        DailySummary,
        DailySummaryResponse,
        DateRange,
        RangePreset,
        SubmissionStats,
        ProcessStats,
        PartStats,
        WorkerStats,
        DailyTrendPoint,
        RankedCount,
        RankedWorker,
        Rankings,
        StatsResponse,
    )),
    tags(
        (name = "models", description = "Product models and the active selection"),
        (name = "options", description = "Per-model code tables"),
        (name = "defect-types", description = "Per-model defect-type digits"),
        (name = "defect-codes", description = "Defect code preview"),
        (name = "submissions", description = "Worker production and defect records"),
        (name = "stats", description = "Defect statistics"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
