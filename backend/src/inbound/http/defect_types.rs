//! Defect-type map HTTP handlers.
//!
//! ```text
//! GET    /api/v1/models/{modelId}/defect-types
//! POST   /api/v1/models/{modelId}/defect-types/reset
//! GET    /api/v1/models/{modelId}/defect-types/{category}
//! POST   /api/v1/models/{modelId}/defect-types/{category}
//! DELETE /api/v1/models/{modelId}/defect-types/{category}/{name}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{DefectTypes, Error, PersistenceWarning};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request payload for adding or overwriting a defect type.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDefectTypeRequest {
    #[schema(example = "소음")]
    pub name: String,
    #[schema(example = "6")]
    pub digit: String,
}

/// The model's defect-type map after a mutation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefectTypesResponse {
    pub defect_types: DefectTypes,
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<PersistenceWarning>,
}

/// Defect names of one category, in resolution order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNames {
    #[schema(example = "5")]
    pub category: String,
    pub names: Vec<String>,
}

/// Full defect-type map of a model.
#[utoipa::path(
    get,
    path = "/api/v1/models/{modelId}/defect-types",
    params(("modelId" = String, Path, description = "Model identifier")),
    responses(
        (status = 200, description = "Defect-type map", body = DefectTypes),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["defect-types"],
    operation_id = "getDefectTypes"
)]
#[get("/models/{model_id}/defect-types")]
pub async fn get_defect_types(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DefectTypes>> {
    let model = state.require_model(&path.into_inner()).await?;
    Ok(web::Json(state.tables_query.defect_types(&model.id).await))
}

/// Defect names of one major category.
#[utoipa::path(
    get,
    path = "/api/v1/models/{modelId}/defect-types/{category}",
    params(
        ("modelId" = String, Path, description = "Model identifier"),
        ("category" = String, Path, description = "Part major category")
    ),
    responses(
        (status = 200, description = "Defect names", body = CategoryNames),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["defect-types"],
    operation_id = "getDefectTypeNames"
)]
#[get("/models/{model_id}/defect-types/{category}")]
pub async fn get_category_names(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<CategoryNames>> {
    let (model_id, category) = path.into_inner();
    let model = state.require_model(&model_id).await?;
    let names = state
        .tables_query
        .defect_types(&model.id)
        .await
        .names_for(&category);
    Ok(web::Json(CategoryNames { category, names }))
}

/// Restore the built-in defect-type map.
#[utoipa::path(
    post,
    path = "/api/v1/models/{modelId}/defect-types/reset",
    params(("modelId" = String, Path, description = "Model identifier")),
    responses(
        (status = 200, description = "Map reset", body = DefectTypesResponse),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["defect-types"],
    operation_id = "resetDefectTypes"
)]
#[post("/models/{model_id}/defect-types/reset")]
pub async fn reset_defect_types(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DefectTypesResponse>> {
    let model = state.require_model(&path.into_inner()).await?;
    let reset = state.tables.reset_defect_types(&model.id).await;
    Ok(web::Json(DefectTypesResponse {
        defect_types: reset.value,
        changed: true,
        warning: reset.warning,
    }))
}

/// Insert or overwrite a defect type.
#[utoipa::path(
    post,
    path = "/api/v1/models/{modelId}/defect-types/{category}",
    params(
        ("modelId" = String, Path, description = "Model identifier"),
        ("category" = String, Path, description = "Part major category")
    ),
    request_body = UpsertDefectTypeRequest,
    responses(
        (status = 201, description = "Defect type stored", body = DefectTypesResponse),
        (status = 400, description = "Blank name or digit", body = Error),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["defect-types"],
    operation_id = "upsertDefectType"
)]
#[post("/models/{model_id}/defect-types/{category}")]
pub async fn upsert_defect_type(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    payload: web::Json<UpsertDefectTypeRequest>,
) -> ApiResult<HttpResponse> {
    let (model_id, category) = path.into_inner();
    let model = state.require_model(&model_id).await?;

    let stored = state
        .tables
        .add_defect_type(&model.id, &category, &payload.name, &payload.digit)
        .await;
    if !stored.value {
        return Err(
            Error::invalid_request("category, name and digit must not be empty")
                .with_details(json!({ "field": "name", "code": "required" })),
        );
    }
    Ok(HttpResponse::Created().json(DefectTypesResponse {
        defect_types: state.tables_query.defect_types(&model.id).await,
        changed: true,
        warning: stored.warning,
    }))
}

/// Remove a defect type from a category.
#[utoipa::path(
    delete,
    path = "/api/v1/models/{modelId}/defect-types/{category}/{name}",
    params(
        ("modelId" = String, Path, description = "Model identifier"),
        ("category" = String, Path, description = "Part major category"),
        ("name" = String, Path, description = "Defect name")
    ),
    responses(
        (status = 200, description = "Defect type removed", body = DefectTypesResponse),
        (status = 404, description = "Unknown model or defect type", body = Error)
    ),
    tags = ["defect-types"],
    operation_id = "removeDefectType"
)]
#[delete("/models/{model_id}/defect-types/{category}/{name}")]
pub async fn remove_defect_type(
    state: web::Data<HttpState>,
    path: web::Path<(String, String, String)>,
) -> ApiResult<web::Json<DefectTypesResponse>> {
    let (model_id, category, name) = path.into_inner();
    let model = state.require_model(&model_id).await?;

    let removed = state
        .tables
        .remove_defect_type(&model.id, &category, &name)
        .await;
    if !removed.value {
        return Err(Error::not_found(format!(
            "'{name}' not found in category {category}"
        )));
    }
    Ok(web::Json(DefectTypesResponse {
        defect_types: state.tables_query.defect_types(&model.id).await,
        changed: true,
        warning: removed.warning,
    }))
}
