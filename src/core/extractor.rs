use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::shared::constants::ANONYMOUS_IDENTIFIER;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Datos JSON inválidos: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Sintaxis JSON inválida: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Falta el tipo de contenido JSON: {}", err)
            }
            _ => "No se pudo interpretar el cuerpo JSON".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Stable per-client key used for admission control.
///
/// Resolution order: first address in `X-Forwarded-For`, then `X-Real-IP`, then
/// the transport peer address, then `"anonymous"`. Never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentifier(String);

impl ClientIdentifier {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = ["x-forwarded-for", "x-real-ip"].iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        });

        let identifier = match (forwarded, peer) {
            (Some(forwarded), _) => forwarded.to_string(),
            (None, Some(peer)) => peer.ip().to_string(),
            (None, None) => ANONYMOUS_IDENTIFIER.to_string(),
        };

        Self(identifier)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<S> FromRequestParts<S> for ClientIdentifier
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::resolve(&parts.headers, peer))
    }
}
