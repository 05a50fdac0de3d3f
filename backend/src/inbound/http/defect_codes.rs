//! Defect code preview handlers.
//!
//! Both endpoints are read-only: they encode observations with the model's
//! current code tables without storing anything.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    DefectCode, DefectObservation, Error, generate_batch, generate_from_codes,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Observations to encode by name.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCodesRequest {
    pub observations: Vec<DefectObservation>,
}

/// An observation whose process and part codes are already known.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedObservation {
    #[schema(example = "B")]
    pub process_code: String,
    #[schema(example = "501")]
    pub part_code: String,
    #[schema(example = "솔밸브-온수")]
    pub part_name: String,
    #[schema(example = "누수")]
    pub defect_description: String,
}

/// Observations with resolved process and part codes.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResolvedRequest {
    pub observations: Vec<ResolvedObservation>,
}

/// Generated codes in request order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedCodes {
    pub codes: Vec<DefectCode>,
}

/// Encode observations by looking up every segment.
#[utoipa::path(
    post,
    path = "/api/v1/models/{modelId}/defect-codes",
    params(("modelId" = String, Path, description = "Model identifier")),
    request_body = GenerateCodesRequest,
    responses(
        (status = 200, description = "Generated codes", body = GeneratedCodes),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["defect-codes"],
    operation_id = "generateDefectCodes"
)]
#[post("/models/{model_id}/defect-codes")]
pub async fn generate_codes(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<GenerateCodesRequest>,
) -> ApiResult<web::Json<GeneratedCodes>> {
    let model = state.require_model(&path.into_inner()).await?;
    let book = state.tables_query.codebook(&model.id).await;
    let codes = generate_batch(&book, &model.product_code, &payload.observations);
    Ok(web::Json(GeneratedCodes { codes }))
}

/// Encode observations whose process and part codes were chosen already.
#[utoipa::path(
    post,
    path = "/api/v1/models/{modelId}/defect-codes/resolved",
    params(("modelId" = String, Path, description = "Model identifier")),
    request_body = GenerateResolvedRequest,
    responses(
        (status = 200, description = "Generated codes", body = GeneratedCodes),
        (status = 404, description = "Unknown model", body = Error)
    ),
    tags = ["defect-codes"],
    operation_id = "generateResolvedDefectCodes"
)]
#[post("/models/{model_id}/defect-codes/resolved")]
pub async fn generate_resolved_codes(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<GenerateResolvedRequest>,
) -> ApiResult<web::Json<GeneratedCodes>> {
    let model = state.require_model(&path.into_inner()).await?;
    let book = state.tables_query.codebook(&model.id).await;
    let codes = payload
        .observations
        .iter()
        .map(|obs| {
            generate_from_codes(
                &book,
                &model.product_code,
                &obs.process_code,
                &obs.part_code,
                &obs.defect_description,
                &obs.part_name,
            )
        })
        .collect();
    Ok(web::Json(GeneratedCodes { codes }))
}
