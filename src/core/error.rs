use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::SecondsFormat;
use thiserror::Error;

use crate::features::chat::clients::ProviderError;
use crate::features::rate_limits::dtos::RateLimitDenial;
use crate::shared::types::ErrorResponse;

const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor";

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limit exceeded for policy {}", .0.policy)]
    RateLimitExceeded(RateLimitDenial),

    #[error("Upstream quota exhausted: {0}")]
    UpstreamQuota(String),

    #[error("Upstream rejected credentials: {0}")]
    UpstreamCredentials(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::QuotaExceeded(msg) => AppError::UpstreamQuota(msg),
            ProviderError::InvalidCredentials(msg) => AppError::UpstreamCredentials(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(msg))
            }
            AppError::RateLimitExceeded(denial) => return rate_limited(denial),
            AppError::UpstreamQuota(msg) => {
                tracing::error!("Upstream quota exhausted: {}", msg);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorResponse::new(
                        "El asistente está recibiendo demasiadas consultas. Intenta más tarde.",
                    ),
                )
            }
            AppError::UpstreamCredentials(msg) => {
                tracing::error!("Upstream rejected credentials: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("El asistente no está disponible en este momento."),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(INTERNAL_ERROR_MESSAGE),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn rate_limited(denial: RateLimitDenial) -> Response {
    let retry_after = denial.retry_after_secs;
    let body = ErrorResponse::with_retry_after(
        format!(
            "Has alcanzado el límite de solicitudes. Intenta de nuevo en {} segundos.",
            retry_after
        ),
        retry_after,
    );

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let reset = denial
        .reset_at
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(denial.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
    if let Ok(value) = HeaderValue::from_str(&reset) {
        headers.insert(X_RATELIMIT_RESET, value);
    }
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));

    response
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::rate_limits::models::PolicyKind;
    use crate::shared::test_helpers::json_body;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_rate_limit_response_shape() {
        let denial = RateLimitDenial {
            policy: PolicyKind::Chat,
            limit: 10,
            reset_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            retry_after_secs: 42,
        };

        let response = AppError::RateLimitExceeded(denial).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let headers = response.headers();
        assert_eq!(headers[X_RATELIMIT_LIMIT], "10");
        assert_eq!(headers[X_RATELIMIT_REMAINING], "0");
        assert_eq!(headers[X_RATELIMIT_RESET], "2026-01-02T03:04:05.000Z");
        assert_eq!(headers[header::RETRY_AFTER], "42");

        let body = json_body(response).await;
        assert_eq!(body["retryAfter"], 42);
        assert!(body["error"].as_str().unwrap().contains("42"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response =
            AppError::Internal("provider said: secret stack trace".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "Error interno del servidor");
        assert!(body.get("retryAfter").is_none());
    }

    #[test]
    fn test_provider_error_mapping() {
        assert!(matches!(
            AppError::from(ProviderError::QuotaExceeded("q".into())),
            AppError::UpstreamQuota(_)
        ));
        assert!(matches!(
            AppError::from(ProviderError::InvalidCredentials("k".into())),
            AppError::UpstreamCredentials(_)
        ));
        assert!(matches!(
            AppError::from(ProviderError::Transport("reset".into())),
            AppError::Internal(_)
        ));
    }
}
