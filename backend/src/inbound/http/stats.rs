//! Statistics HTTP handler.
//!
//! `GET /api/v1/stats` aggregates one model's submissions over a date range.
//! The range comes from explicit `start`/`end` dates or from a preset
//! anchored at `end` (default: today).

use actix_web::{get, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{DateRange, RankedCount, StatFilters, SubmissionStats, WorkerStats};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Days covered when neither dates nor a preset are given.
pub const DEFAULT_DAYS: u32 = 7;

/// Date selector presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RangePreset {
    /// Only the anchor day.
    Day,
    /// `days` days ending at the anchor.
    LastDays,
    /// Monday of the anchor's week through the anchor.
    Week,
    /// First of the anchor's month through the anchor.
    Month,
}

/// Query parameters for `/stats`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct StatsQuery {
    /// Model id; defaults to the selected model.
    pub model: Option<String>,
    /// First included date.
    #[param(value_type = Option<String>, format = Date)]
    pub start: Option<NaiveDate>,
    /// Last included date, also the preset anchor.
    #[param(value_type = Option<String>, format = Date)]
    pub end: Option<NaiveDate>,
    /// Day count for the `lastDays` preset.
    pub days: Option<u32>,
    /// Range preset used when `start` is absent; defaults to `lastDays`.
    #[param(inline)]
    pub preset: Option<RangePreset>,
    /// Exact process name filter.
    pub process: Option<String>,
    /// Exact worker name filter.
    pub worker: Option<String>,
    /// Exact part name filter, applied per defect entry.
    pub part: Option<String>,
    /// Exact defect type filter, applied per defect entry.
    pub defect_type: Option<String>,
}

impl StatsQuery {
    fn range(&self, today: NaiveDate) -> DateRange {
        let anchor = self.end.unwrap_or(today);
        if let Some(start) = self.start {
            return DateRange::new(start, anchor);
        }
        let days = self.days.unwrap_or(DEFAULT_DAYS);
        match self.preset.unwrap_or(RangePreset::LastDays) {
            RangePreset::Day => DateRange::single_day(anchor),
            RangePreset::LastDays => DateRange::last_days(anchor, days),
            RangePreset::Week => DateRange::week_to_date(anchor),
            RangePreset::Month => DateRange::month_to_date(anchor),
        }
    }

    fn filters(&self) -> StatFilters {
        StatFilters {
            process: self.process.clone(),
            worker: self.worker.clone(),
            part: self.part.clone(),
            defect_type: self.defect_type.clone(),
        }
    }
}

/// One worker ranking row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedWorker {
    /// Worker display name.
    pub name: String,
    /// Production and defect totals of the worker.
    #[serde(flatten)]
    pub stats: WorkerStats,
}

/// Ranked views of a snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    /// Defect types by count, highest first.
    pub defect_types: Vec<RankedCount>,
    /// Parts by defect count, highest first.
    pub parts: Vec<RankedCount>,
    /// `part-defect type` pairs by count, highest first.
    pub defect_details: Vec<RankedCount>,
    /// Workers by defect rate, highest first.
    pub workers: Vec<RankedWorker>,
}

impl From<&SubmissionStats> for Rankings {
    fn from(stats: &SubmissionStats) -> Self {
        Self {
            defect_types: stats.ranked_defect_types(),
            parts: stats.ranked_parts(),
            defect_details: stats.ranked_defect_details(),
            workers: stats
                .ranked_workers()
                .into_iter()
                .map(|(name, stats)| RankedWorker { name, stats })
                .collect(),
        }
    }
}

/// Aggregate snapshot plus rankings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Model the statistics cover.
    #[schema(example = "ICH-3000")]
    pub model: String,
    /// Inclusive date range applied.
    pub range: DateRange,
    /// Aggregated totals.
    pub stats: SubmissionStats,
    /// Ranked views of `stats`.
    pub rankings: Rankings,
}

/// Statistics for one model and date range.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Aggregated statistics", body = StatsResponse),
        (status = 400, description = "Malformed query", body = crate::domain::Error),
        (status = 404, description = "Unknown model", body = crate::domain::Error)
    ),
    tags = ["stats"],
    operation_id = "getStats"
)]
#[get("/stats")]
pub async fn get_stats(
    state: web::Data<HttpState>,
    query: web::Query<StatsQuery>,
) -> ApiResult<web::Json<StatsResponse>> {
    let model = state.model_or_selected(query.model.as_deref()).await?;
    let range = query.range(state.today());
    let stats = state
        .submissions_query
        .stats(&model.id, range, query.filters())
        .await;
    let rankings = Rankings::from(&stats);
    Ok(web::Json(StatsResponse {
        model: model.id,
        range,
        stats,
        rankings,
    }))
}
