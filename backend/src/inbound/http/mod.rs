//! HTTP inbound adapter exposing REST endpoints.

pub mod defect_codes;
pub mod defect_types;
pub mod error;
pub mod health;
pub mod models;
pub mod options;
pub mod state;
pub mod stats;
pub mod submissions;

use actix_web::{Scope, web};

pub use error::ApiResult;

/// Every `/api/v1` endpoint with the JSON, query and path error handlers.
///
/// Literal `reset` and `resolved` routes are registered ahead of the
/// parameterised routes they would otherwise collide with.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(models::list_models)
        .service(models::add_model)
        .service(models::select_model)
        .service(models::remove_model)
        .service(options::get_options)
        .service(options::reset_options)
        .service(options::add_option)
        .service(options::remove_option)
        .service(defect_types::get_defect_types)
        .service(defect_types::reset_defect_types)
        .service(defect_types::get_category_names)
        .service(defect_types::upsert_defect_type)
        .service(defect_types::remove_defect_type)
        .service(defect_codes::generate_resolved_codes)
        .service(defect_codes::generate_codes)
        .service(submissions::list_submissions)
        .service(submissions::add_submission)
        .service(submissions::daily_summary)
        .service(submissions::delete_submission)
        .service(stats::get_stats)
}
