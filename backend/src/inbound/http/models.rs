//! Product model HTTP handlers.
//!
//! ```text
//! GET    /api/v1/models
//! POST   /api/v1/models
//! DELETE /api/v1/models/{modelId}
//! PUT    /api/v1/models/selected
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::ModelList;
use crate::domain::{Error, ModelConfig, Persisted, PersistenceWarning};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request payload for adding a model.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddModelRequest {
    #[schema(example = "WP-100")]
    pub id: String,
    #[schema(example = "W10")]
    pub product_code: String,
}

/// Request payload for changing the selected model.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectModelRequest {
    #[schema(example = "EP-7000")]
    pub id: String,
}

/// One model plus any persistence warning.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub model: ModelConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<PersistenceWarning>,
}

impl From<Persisted<ModelConfig>> for ModelResponse {
    fn from(value: Persisted<ModelConfig>) -> Self {
        Self {
            model: value.value,
            warning: value.warning,
        }
    }
}

/// List models and the current selection.
#[utoipa::path(
    get,
    path = "/api/v1/models",
    responses((status = 200, description = "Configured models", body = ModelList)),
    tags = ["models"],
    operation_id = "listModels"
)]
#[get("/models")]
pub async fn list_models(state: web::Data<HttpState>) -> ApiResult<web::Json<ModelList>> {
    Ok(web::Json(state.models.list().await))
}

/// Add a product model.
#[utoipa::path(
    post,
    path = "/api/v1/models",
    request_body = AddModelRequest,
    responses(
        (status = 201, description = "Model added", body = ModelResponse),
        (status = 400, description = "Blank id or product code", body = Error),
        (status = 409, description = "Duplicate model id", body = Error)
    ),
    tags = ["models"],
    operation_id = "addModel"
)]
#[post("/models")]
pub async fn add_model(
    state: web::Data<HttpState>,
    payload: web::Json<AddModelRequest>,
) -> ApiResult<HttpResponse> {
    let AddModelRequest { id, product_code } = payload.into_inner();
    let added = state.models.add(&id, &product_code).await?;
    Ok(HttpResponse::Created().json(ModelResponse::from(added)))
}

/// Remove a model and purge its code tables.
#[utoipa::path(
    delete,
    path = "/api/v1/models/{modelId}",
    params(("modelId" = String, Path, description = "Model identifier")),
    responses(
        (status = 200, description = "Model removed", body = ModelResponse),
        (status = 400, description = "Last or selected model", body = Error),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["models"],
    operation_id = "removeModel"
)]
#[delete("/models/{model_id}")]
pub async fn remove_model(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ModelResponse>> {
    let removed = state.models.remove(&path.into_inner()).await?;
    Ok(web::Json(removed.into()))
}

/// Change the selected model.
#[utoipa::path(
    put,
    path = "/api/v1/models/selected",
    request_body = SelectModelRequest,
    responses(
        (status = 200, description = "Model selected", body = ModelResponse),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["models"],
    operation_id = "selectModel"
)]
#[put("/models/selected")]
pub async fn select_model(
    state: web::Data<HttpState>,
    payload: web::Json<SelectModelRequest>,
) -> ApiResult<web::Json<ModelResponse>> {
    let selected = state.models.select(payload.id.trim()).await?;
    Ok(web::Json(selected.into()))
}
