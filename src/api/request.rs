// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测请求与校验

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::errors::DetectError;

pub const MISSING_IMAGE: &str = "img_base64 not found in request";

/// `POST /detect` 请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectRequest {
    /// base64 编码的 JPEG/PNG 图像
    ///
    /// 字段缺失为 `None`; 字段存在时 (包括 `null`) 原样保留为 `Some`
    #[serde(default, deserialize_with = "present")]
    pub img_base64: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl DetectRequest {
    /// 解析原始请求体, JSON 格式错误不算校验失败
    pub fn from_slice(body: &[u8]) -> Result<Self, DetectError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// 取出图像字段: 缺失为 400, 存在但不是字符串为 500
    pub fn into_image(self) -> Result<String, DetectError> {
        let value = self
            .img_base64
            .ok_or_else(|| DetectError::Validation(MISSING_IMAGE.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field() {
        let request = DetectRequest::from_slice(br#"{"image": "abc"}"#).unwrap();
        let err = request.into_image().unwrap_err();
        assert!(matches!(err, DetectError::Validation(_)));
        assert_eq!(err.to_string(), MISSING_IMAGE);
    }

    #[test]
    fn test_present_field() {
        let request = DetectRequest::from_slice(br#"{"img_base64": "dGVzdA=="}"#).unwrap();
        assert_eq!(request.into_image().unwrap(), "dGVzdA==");
    }

    #[test]
    fn test_null_field_is_not_missing() {
        let request = DetectRequest::from_slice(br#"{"img_base64": null}"#).unwrap();
        let err = request.into_image().unwrap_err();
        assert!(matches!(err, DetectError::BadRequestBody(_)));
        assert!(err.to_string().contains("expected a string"));
    }

    #[test]
    fn test_non_string_field() {
        let request = DetectRequest::from_slice(br#"{"img_base64": 42}"#).unwrap();
        let err = request.into_image().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_malformed_json() {
        let err = DetectRequest::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, DetectError::BadRequestBody(_)));
    }
}
