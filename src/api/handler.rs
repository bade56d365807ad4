// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测接口处理函数

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::errors::DetectError;
use super::request::DetectRequest;
use super::response::DetectResponse;
use super::AppState;
use crate::codec;
use crate::detection::{crowd, fire};

/// POST /detect - 人群密度 + 火焰/烟雾检测
///
/// 请求体 `{"img_base64": "..."}`. 解码, 两次推理, 绘制与编码都在阻塞线程池执行.
/// 请求体读取失败 (如超过大小限制) 也返回 JSON 错误.
pub async fn detect_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DetectResponse>, DetectError> {
    let img_base64 = DetectRequest::from_slice(&body?)?.into_image()?;

    let response = tokio::task::spawn_blocking(move || run_detection(&state, &img_base64))
        .await
        .map_err(|e| DetectError::Internal(format!("detection task failed: {}", e)))??;

    Ok(Json(response))
}

/// GET /health - 存活检查与两个模型的类别名
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "models": {
            "crowd": state.crowd.names(),
            "fire": state.fire.names(),
        },
    }))
}

/// 单张图像的同步流水线
///
/// 解码 → 人群检测 → 密度 → 火焰检测 → 计数/告警 → 绘制 → 编码
pub fn run_detection(state: &AppState, img_base64: &str) -> Result<DetectResponse, DetectError> {
    let t = Instant::now();
    let frame = codec::decode(img_base64).map_err(DetectError::Decode)?;
    let (width, height) = (frame.width(), frame.height());
    debug!("decoded {}x{} image in {:?}", width, height, t.elapsed());

    // 1. 人群
    let t_crowd = Instant::now();
    let crowd_detections = state
        .crowd
        .detect(&frame)
        .map_err(DetectError::Inference)?;
    let crowd_summary = crowd::summarize(
        &crowd_detections,
        &state.settings.person_label,
        width,
        height,
    );
    let crowd_annotated = state.annotator.annotate(&frame, &crowd_detections);
    let crowd_annotated_img_base64 = codec::encode(&crowd_annotated).map_err(DetectError::Encode)?;
    debug!("crowd stage: {:?}", t_crowd.elapsed());

    // 2. 火焰/烟雾, 复用同一帧
    let t_fire = Instant::now();
    let fire_detections = state.fire.detect(&frame).map_err(DetectError::Inference)?;
    let fire_summary = fire::summarize(&fire_detections);
    let fire_annotated = state.annotator.annotate(&frame, &fire_detections);
    let annotated_img_base64 = codec::encode(&fire_annotated).map_err(DetectError::Encode)?;
    debug!("fire stage: {:?}", t_fire.elapsed());

    info!(
        "🔍 {}x{} | people: {} density: {} | fire: {} smoke: {} alert: {:?} | {:.1}ms",
        width,
        height,
        crowd_summary.person_count,
        crowd_summary.density,
        fire_summary.fire_count,
        fire_summary.smoke_count,
        fire_summary.alert_type(),
        t.elapsed().as_secs_f64() * 1000.0
    );

    Ok(DetectResponse {
        annotated_img_base64,
        fire_count: fire_summary.fire_count,
        smoke_count: fire_summary.smoke_count,
        alert_type: fire_summary.alert_type(),
        location: state.settings.location.clone(),
        crowd_annotated_img_base64,
        crowd_density: crowd_summary.density,
    })
}
