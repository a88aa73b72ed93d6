use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIdentifier};
use crate::shared::types::{ApiResponse, ErrorResponse};

use super::super::dtos::{ContactReceiptDto, ContactRequestDto};
use super::super::services::ContactService;

#[derive(Clone)]
pub struct ContactState {
    pub contact_service: Arc<ContactService>,
}

/// Submit a contact request
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequestDto,
    responses(
        (status = 201, description = "Contact request received", body = ApiResponse<ContactReceiptDto>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "contact"
)]
pub async fn submit_contact(
    State(state): State<ContactState>,
    client: ClientIdentifier,
    AppJson(dto): AppJson<ContactRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<ContactReceiptDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(format!("Solicitud inválida: {}", e)))?;

    let receipt = state.contact_service.submit(&client, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(receipt),
            Some("Gracias, nos pondremos en contacto contigo pronto.".to_string()),
        )),
    ))
}
