// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! HTTP 接口
//!
//! - `POST /detect`: 对 base64 图像做人群密度 + 火焰/烟雾检测
//! - `GET /health`: 存活检查, 返回已加载模型的类别名

pub mod errors;
pub mod handler;
pub mod request;
pub mod response;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{Annotator, Detector};

pub use errors::DetectError;
pub use handler::{detect_handler, health_handler, run_detection};
pub use request::DetectRequest;
pub use response::DetectResponse;

/// 写入每个响应的服务配置
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub location: String,
    pub person_label: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            location: "E Block".to_string(),
            person_label: "people".to_string(),
        }
    }
}

/// 所有请求共享的只读句柄
#[derive(Clone)]
pub struct AppState {
    pub crowd: Arc<dyn Detector>,
    pub fire: Arc<dyn Detector>,
    pub annotator: Arc<Annotator>,
    pub settings: Arc<ServiceSettings>,
}

impl AppState {
    pub fn new(
        crowd: Arc<dyn Detector>,
        fire: Arc<dyn Detector>,
        annotator: Annotator,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            crowd,
            fire,
            annotator: Arc::new(annotator),
            settings: Arc::new(settings),
        }
    }
}

/// 超过 `max_body_bytes` 的请求体由处理函数转成 JSON 错误
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/detect", post(detect_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
