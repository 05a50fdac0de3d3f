//! Worker submission HTTP handlers.
//!
//! ```text
//! GET    /api/v1/submissions?model=
//! POST   /api/v1/submissions
//! GET    /api/v1/submissions/daily?model=&date=
//! DELETE /api/v1/submissions/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{
    DailySummary, Error, PersistenceWarning, SubmissionDraft, WorkerSubmission,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Optional model filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Restrict to one model.
    pub model: Option<String>,
}

/// Model and day selection for the daily summary.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyQuery {
    /// Model id; defaults to the selected model.
    pub model: Option<String>,
    /// Work date; defaults to today.
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

/// A recorded or deleted submission plus any persistence warning.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub submission: WorkerSubmission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<PersistenceWarning>,
}

/// Daily totals for one model.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    #[schema(example = "ICH-3000")]
    pub model: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub summary: DailySummary,
}

/// List submissions newest first.
#[utoipa::path(
    get,
    path = "/api/v1/submissions",
    params(ListQuery),
    responses((status = 200, description = "Submissions", body = [WorkerSubmission])),
    tags = ["submissions"],
    operation_id = "listSubmissions"
)]
#[get("/submissions")]
pub async fn list_submissions(
    state: web::Data<HttpState>,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<Vec<WorkerSubmission>>> {
    let model = query
        .into_inner()
        .model
        .map(|model| model.trim().to_owned())
        .filter(|model| !model.is_empty());
    Ok(web::Json(state.submissions_query.list(model).await))
}

/// Record a worker submission.
#[utoipa::path(
    post,
    path = "/api/v1/submissions",
    request_body = SubmissionDraft,
    responses(
        (status = 201, description = "Submission recorded", body = SubmissionResponse),
        (status = 400, description = "Validation failed", body = Error),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["submissions"],
    operation_id = "addSubmission"
)]
#[post("/submissions")]
pub async fn add_submission(
    state: web::Data<HttpState>,
    payload: web::Json<SubmissionDraft>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner();
    let model_id = draft.model.trim();
    if !model_id.is_empty() {
        state.require_model(model_id).await?;
    }
    let recorded = state.submissions.add(draft).await?;
    Ok(HttpResponse::Created().json(SubmissionResponse {
        submission: recorded.value,
        warning: recorded.warning,
    }))
}

/// Production, defects and rate of one model on one day.
#[utoipa::path(
    get,
    path = "/api/v1/submissions/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Daily summary", body = DailySummaryResponse),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["submissions"],
    operation_id = "dailySummary"
)]
#[get("/submissions/daily")]
pub async fn daily_summary(
    state: web::Data<HttpState>,
    query: web::Query<DailyQuery>,
) -> ApiResult<web::Json<DailySummaryResponse>> {
    let DailyQuery { model, date } = query.into_inner();
    let model = state.model_or_selected(model.as_deref()).await?;
    let date = date.unwrap_or_else(|| state.today());
    let summary = state.submissions_query.daily_summary(&model.id, date).await;
    Ok(web::Json(DailySummaryResponse {
        model: model.id,
        date,
        summary,
    }))
}

/// Delete a submission.
#[utoipa::path(
    delete,
    path = "/api/v1/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission identifier")),
    responses(
        (status = 200, description = "Submission deleted", body = SubmissionResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown submission", body = Error)
    ),
    tags = ["submissions"],
    operation_id = "deleteSubmission"
)]
#[delete("/submissions/{id}")]
pub async fn delete_submission(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<SubmissionResponse>> {
    let deleted = state.submissions.delete(path.into_inner()).await?;
    Ok(web::Json(SubmissionResponse {
        submission: deleted.value,
        warning: deleted.warning,
    }))
}
