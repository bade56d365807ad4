// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! HTTP 层错误
//!
//! 所有失败都返回 `{"error": "<message>"}`. 只有校验失败是 400, 其余一律 500.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("{0}")]
    Validation(String),

    /// 请求体读取失败, 例如超过大小限制
    #[error("{0}")]
    Body(#[from] BytesRejection),

    #[error("{0}")]
    BadRequestBody(#[from] serde_json::Error),

    #[error("{0}")]
    Decode(#[source] CodecError),

    #[error("{0:#}")]
    Inference(anyhow::Error),

    #[error("{0}")]
    Encode(#[source] CodecError),

    #[error("{0}")]
    Internal(String),
}

impl DetectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!("❌ detect failed: {}", message);
        } else {
            warn!("⚠️ rejected request: {}", message);
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DetectError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DetectError::Decode(CodecError::Empty).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DetectError::Inference(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_inference_message_keeps_context_chain() {
        let err = anyhow::anyhow!("session died").context("fire inference failed");
        assert_eq!(
            DetectError::Inference(err).to_string(),
            "fire inference failed: session died"
        );
    }
}
