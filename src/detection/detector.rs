//! 检测器 (Detector)
//! 职责: 图像 → YOLO检测 → 带类别名的检测结果

use std::time::Instant;

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::{debug, info};

use super::types::Detection;
use crate::{ModelArgs, YOLOv8};

/// 检测器接口
///
/// 启动时加载一次, 之后只读, 由各请求共享
pub trait Detector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;

    /// 类别名表, 下标即类别编号
    fn names(&self) -> Vec<String>;
}

/// 基于 ONNX Runtime 的 YOLOv8 检测器
pub struct OnnxDetector {
    name: String,
    model: YOLOv8,
}

impl OnnxDetector {
    pub fn load(name: &str, config: ModelArgs) -> Result<Self> {
        let path = config.model.clone();
        let model = YOLOv8::new(config)
            .with_context(|| format!("Failed to load {} model from {}", name, path))?;
        info!("✅ {} 检测模型加载成功: {}", name, path);
        model.summary();
        Ok(Self {
            name: name.to_string(),
            model,
        })
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let t = Instant::now();
        let results = self
            .model
            .run(std::slice::from_ref(image))
            .with_context(|| format!("{} inference failed", self.name))?;

        let names = self.model.names();
        let detections: Vec<Detection> = results
            .into_iter()
            .flatten()
            .map(|bbox| Detection::from_bbox(bbox, names))
            .collect();

        debug!(
            "🎯 {}: {} detections in {:.1}ms",
            self.name,
            detections.len(),
            t.elapsed().as_secs_f64() * 1000.0
        );
        Ok(detections)
    }

    fn names(&self) -> Vec<String> {
        self.model.names().to_vec()
    }
}
