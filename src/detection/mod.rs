/// 检测系统 (Detection System)
///
/// - Detector: 检测器接口 (可注入, 测试时替换为假实现)
/// - crowd:    人数统计与人群密度
/// - fire:     火焰/烟雾计数与告警
pub mod crowd;
pub mod detector;
pub mod fire;
pub mod types;

pub use detector::{Detector, OnnxDetector};
pub use types::Detection;
