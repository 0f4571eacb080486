//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::common::ApiError;
use crate::repository::StorageError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization error: {message}")]
    Unauthorized { message: String },

    #[error("Malformed {topic} payload from {shop_domain}: {message}")]
    MalformedPayload {
        topic: String,
        shop_domain: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn malformed(
        topic: impl Into<String>,
        shop_domain: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedPayload {
            topic: topic.into(),
            shop_domain: shop_domain.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. } | Self::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Configuration { .. } | Self::Storage(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else if status != StatusCode::NOT_FOUND {
            warn!(error = %self, "Request rejected");
        }

        let details = match &self {
            Self::MalformedPayload { topic, shop_domain, .. } => Some(serde_json::json!({
                "topic": topic,
                "shopDomain": shop_domain,
            })),
            _ => None,
        };
        let body = ApiError {
            error: self.error_code().to_string(),
            message: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(PlatformError::unauthorized("bad").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            PlatformError::configuration("missing").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PlatformError::malformed("orders/paid", "shop.example", "bad json").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PlatformError::from(StorageError::Timeout(Duration::from_secs(1))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(PlatformError::not_found("AffiliateLink", "X").status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_malformed_message_carries_context() {
        let err = PlatformError::malformed("orders/create", "demo.myshopify.com", "expected value");
        let text = err.to_string();
        assert!(text.contains("orders/create"));
        assert!(text.contains("demo.myshopify.com"));
    }
}
