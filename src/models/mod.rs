/// 模型实现
///
/// 目前只有 YOLOv8 检测模型 (Ultralytics 导出的 ONNX):
/// - `YOLOv8`: 会话 + 预处理 + 推理 + 后处理
/// - `YOLOv8Postprocessor`: 不依赖会话的后处理, 可单独使用
///
/// ```text
/// 原始图片 → preprocess → NCHW 张量
///          ↓
///     OrtBackend::run
///          ↓
///     [batch, 4 + nc, anchors] → postprocess → Vec<Bbox>
/// ```
pub mod yolov8;

pub use yolov8::{YOLOv8, YOLOv8Config, YOLOv8Postprocessor};
