//! Response envelope and error shape shared by every endpoint.
//!
//! Successful responses are `{"data": …}` with an optional `total`; errors
//! are `{"error": "…"}` with the matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{ "data": T, "total"? }`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data, total: None })
    }

    pub fn with_total(data: T, total: i64) -> Json<Self> {
        Json(Self {
            data,
            total: Some(total),
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error half of every handler's return type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::warn!(error = %e, "database error serving read API");
        Self::internal(format!("database error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn envelope_omits_absent_total() {
        let body = serde_json::to_value(Envelope {
            data: vec![1, 2, 3],
            total: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"data": [1, 2, 3]}));

        let body = serde_json::to_value(Envelope {
            data: vec![1],
            total: Some(1),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"data": [1], "total": 1}));
    }

    #[tokio::test]
    async fn error_shape_and_status() {
        let resp = ApiError::bad_request("bad date").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "bad date");
    }
}
