//! Code table HTTP handlers.
//!
//! ```text
//! GET    /api/v1/models/{modelId}/options
//! POST   /api/v1/models/{modelId}/options/reset
//! POST   /api/v1/models/{modelId}/options/{table}
//! DELETE /api/v1/models/{modelId}/options/{table}/{name}
//! ```
//!
//! The reset route must be registered before the `{table}` route.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Error, OptionTable, OptionTables, PersistenceWarning};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request payload for adding a table entry.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    #[schema(example = "필터")]
    pub name: String,
    #[schema(example = "701")]
    pub code: String,
}

/// The model's tables after a mutation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    pub tables: OptionTables,
    /// Whether the mutation changed anything.
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<PersistenceWarning>,
}

pub(crate) fn parse_table(raw: &str) -> Result<OptionTable, Error> {
    raw.parse::<OptionTable>().map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "table", "code": "unknown_table" }))
    })
}

fn require_text(value: &str, field: &'static str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be empty"))
            .with_details(json!({ "field": field, "code": "required" })));
    }
    Ok(())
}

async fn tables_response(
    state: &HttpState,
    model_id: &str,
    changed: bool,
    warning: Option<PersistenceWarning>,
) -> TablesResponse {
    TablesResponse {
        tables: state.tables_query.tables(model_id).await,
        changed,
        warning,
    }
}

/// Current code tables of a model.
#[utoipa::path(
    get,
    path = "/api/v1/models/{modelId}/options",
    params(("modelId" = String, Path, description = "Model identifier")),
    responses(
        (status = 200, description = "Code tables", body = OptionTables),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["options"],
    operation_id = "getOptions"
)]
#[get("/models/{model_id}/options")]
pub async fn get_options(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<OptionTables>> {
    let model = state.require_model(&path.into_inner()).await?;
    Ok(web::Json(state.tables_query.tables(&model.id).await))
}

/// Restore the built-in tables of a model.
#[utoipa::path(
    post,
    path = "/api/v1/models/{modelId}/options/reset",
    params(("modelId" = String, Path, description = "Model identifier")),
    responses(
        (status = 200, description = "Tables reset", body = TablesResponse),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["options"],
    operation_id = "resetOptions"
)]
#[post("/models/{model_id}/options/reset")]
pub async fn reset_options(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<TablesResponse>> {
    let model = state.require_model(&path.into_inner()).await?;
    let reset = state.tables.reset_tables(&model.id).await;
    Ok(web::Json(TablesResponse {
        tables: reset.value,
        changed: true,
        warning: reset.warning,
    }))
}

/// Append an entry to one table.
#[utoipa::path(
    post,
    path = "/api/v1/models/{modelId}/options/{table}",
    params(
        ("modelId" = String, Path, description = "Model identifier"),
        ("table" = String, Path, description = "processes, parts, defectCauses or workers")
    ),
    request_body = AddEntryRequest,
    responses(
        (status = 201, description = "Entry added", body = TablesResponse),
        (status = 400, description = "Blank name or code, or unknown table", body = Error),
        (status = 404, description = "Unknown model", body = Error),
        (status = 409, description = "Name already present", body = Error)
    ),
    tags = ["options"],
    operation_id = "addOption"
)]
#[post("/models/{model_id}/options/{table}")]
pub async fn add_option(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    payload: web::Json<AddEntryRequest>,
) -> ApiResult<HttpResponse> {
    let (model_id, table) = path.into_inner();
    let table = parse_table(&table)?;
    let model = state.require_model(&model_id).await?;
    require_text(&payload.name, "name")?;
    require_text(&payload.code, "code")?;

    let added = state
        .tables
        .add_entry(&model.id, table, &payload.name, &payload.code)
        .await;
    if !added.value {
        return Err(Error::conflict(format!(
            "'{}' already exists in {table}",
            payload.name.trim()
        ))
        .with_details(json!({ "field": "name", "code": "duplicate_name" })));
    }
    let body = tables_response(&state, &model.id, true, added.warning).await;
    Ok(HttpResponse::Created().json(body))
}

/// Remove an entry from one table.
#[utoipa::path(
    delete,
    path = "/api/v1/models/{modelId}/options/{table}/{name}",
    params(
        ("modelId" = String, Path, description = "Model identifier"),
        ("table" = String, Path, description = "processes, parts, defectCauses or workers"),
        ("name" = String, Path, description = "Entry name")
    ),
    responses(
        (status = 200, description = "Entry removed", body = TablesResponse),
        (status = 400, description = "Unknown table", body = Error),
        (status = 404, description = "Unknown model or entry", body = Error)
    ),
    tags = ["options"],
    operation_id = "removeOption"
)]
#[delete("/models/{model_id}/options/{table}/{name}")]
pub async fn remove_option(
    state: web::Data<HttpState>,
    path: web::Path<(String, String, String)>,
) -> ApiResult<web::Json<TablesResponse>> {
    let (model_id, table, name) = path.into_inner();
    let table = parse_table(&table)?;
    let model = state.require_model(&model_id).await?;

    let removed = state.tables.remove_entry(&model.id, table, &name).await;
    if !removed.value {
        return Err(Error::not_found(format!("'{name}' not found in {table}")));
    }
    Ok(web::Json(
        tables_response(&state, &model.id, true, removed.warning).await,
    ))
}
