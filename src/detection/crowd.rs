//! 人群统计: 人数与密度

use super::types::Detection;

/// 每像素人数的放大系数
pub const DENSITY_SCALE: f64 = 50_000.0;

/// 密度保留的小数位
const DENSITY_DECIMALS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowdSummary {
    pub person_count: usize,
    pub density: f64,
}

/// 统计类别名为 `person_label` 的检测框
pub fn count_people(detections: &[Detection], person_label: &str) -> usize {
    detections.iter().filter(|d| d.is(person_label)).count()
}

/// `round(person_count / (h * w), 6) * 50000`, 宽或高为 0 时面积记为 1
pub fn crowd_density(person_count: usize, width: u32, height: u32) -> f64 {
    let area = if width > 0 && height > 0 {
        width as f64 * height as f64
    } else {
        1.0
    };
    round_to(person_count as f64 / area, DENSITY_DECIMALS) * DENSITY_SCALE
}

pub fn summarize(
    detections: &[Detection],
    person_label: &str,
    width: u32,
    height: u32,
) -> CrowdSummary {
    let person_count = count_people(detections, person_label);
    CrowdSummary {
        person_count,
        density: crowd_density(person_count, width, height),
    }
}

/// 按 x 的精确二进制值舍入, 恰好一半时取偶 (`{:.N}` 格式化的舍入规则)
fn round_to(x: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, x).parse().unwrap_or(x)
}
