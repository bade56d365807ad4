// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测响应

use serde::{Deserialize, Serialize};

/// `POST /detect` 响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    /// 画上火焰/烟雾检测框的图像, base64 JPEG
    pub annotated_img_base64: String,
    pub fire_count: usize,
    pub smoke_count: usize,
    /// 最严重的告警, 没有达标检测时为空
    #[serde(rename = "alertType")]
    pub alert_type: String,
    pub location: String,
    /// 画上人群检测框的图像, base64 JPEG
    pub crowd_annotated_img_base64: String,
    pub crowd_density: f64,
}
