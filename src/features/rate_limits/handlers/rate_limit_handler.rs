use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::{AppError, Result};
use crate::core::extractor::ClientIdentifier;
use crate::features::rate_limits::dtos::RateLimitStatusDto;
use crate::features::rate_limits::models::PolicyKind;
use crate::features::rate_limits::services::AdmissionController;
use crate::shared::types::{ApiResponse, ErrorResponse};

/// Get the caller's current rate limit standing
///
/// Does not count as a request against the policy.
#[utoipa::path(
    get,
    path = "/api/rate-limit/{policy}",
    params(
        ("policy" = String, Path, description = "Policy name: `chat` or `contact`")
    ),
    responses(
        (status = 200, description = "Caller's rate limit status", body = ApiResponse<RateLimitStatusDto>),
        (status = 400, description = "Unknown policy", body = ErrorResponse)
    ),
    tag = "rate-limits"
)]
pub async fn get_rate_limit_status(
    State(controller): State<Arc<AdmissionController>>,
    client: ClientIdentifier,
    Path(policy): Path<String>,
) -> Result<Json<ApiResponse<RateLimitStatusDto>>> {
    let kind = policy.parse::<PolicyKind>().map_err(AppError::BadRequest)?;
    let status = controller.status(kind, client.as_str());
    Ok(Json(ApiResponse::success(Some(status), None)))
}
