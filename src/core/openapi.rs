use utoipa::{Modify, OpenApi};

use crate::features::chat::{dtos as chat_dtos, handlers::chat_handler};
use crate::features::contact::{dtos as contact_dtos, handlers::contact_handler};
use crate::features::rate_limits::{
    dtos as rate_limits_dtos, handlers::rate_limit_handler, models as rate_limits_models,
};
use crate::shared::types::{ApiResponse, ErrorResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Chat
        chat_handler::chat_stream,
        // Contact
        contact_handler::submit_contact,
        // Rate Limits
        rate_limit_handler::get_rate_limit_status,
    ),
    components(schemas(
        ErrorResponse,
        // Chat
        chat_dtos::ChatRole,
        chat_dtos::ChatMessage,
        chat_dtos::ChatRequestDto,
        chat_dtos::StreamEvent,
        // Contact
        contact_dtos::ContactRequestDto,
        contact_dtos::ContactReceiptDto,
        ApiResponse<contact_dtos::ContactReceiptDto>,
        // Rate Limits
        rate_limits_models::PolicyKind,
        rate_limits_dtos::RateLimitStatusDto,
        ApiResponse<rate_limits_dtos::RateLimitStatusDto>,
    )),
    tags(
        (name = "chat", description = "Streaming conversation with the website assistant"),
        (name = "contact", description = "Contact requests from website visitors"),
        (name = "rate-limits", description = "Per-client admission status"),
    ),
    info(
        title = "Talento Gateway API",
        version = "0.1.0",
        description = "Chat and contact gateway for the Talento website",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
