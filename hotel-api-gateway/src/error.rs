use axum::{http::StatusCode, response::Json};
use hotel_core::ServiceError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, message) = match &self {
            ApiError::Service(err) => {
                let kind = err.kind();
                let status = StatusCode::from_u16(kind.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, kind.as_str(), err.public_message())
            }
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "Invalid token".to_string(),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}
