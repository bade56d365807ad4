//! 火焰/烟雾计数与告警等级

use std::cmp::Ordering;

use super::types::Detection;

/// 计入统计的最低置信度 (严格大于)
pub const MIN_CONFIDENCE: f32 = 0.55;

/// 高于此置信度使用更高等级的告警文案 (严格大于)
pub const SEVERE_CONFIDENCE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Hazard {
    Smoke,
    Fire,
}

impl Hazard {
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("fire") {
            Some(Hazard::Fire)
        } else if label.eq_ignore_ascii_case("smoke") {
            Some(Hazard::Smoke)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alert {
    pub hazard: Hazard,
    pub confidence: f32,
}

impl Alert {
    pub fn message(&self) -> &'static str {
        let severe = self.confidence > SEVERE_CONFIDENCE;
        match (self.hazard, severe) {
            (Hazard::Fire, true) => "Emergency: Fire Detected",
            (Hazard::Fire, false) => "Warning: Fire Detected",
            (Hazard::Smoke, true) => "Caution: Smoke Detected",
            (Hazard::Smoke, false) => "Warning: Smoke Detected",
        }
    }

    // 火焰优先于烟雾, 同类比较置信度
    fn severity_cmp(&self, other: &Alert) -> Ordering {
        self.hazard
            .cmp(&other.hazard)
            .then(self.confidence.total_cmp(&other.confidence))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FireSummary {
    pub fire_count: usize,
    pub smoke_count: usize,
    pub alert: Option<Alert>,
}

impl FireSummary {
    /// 无告警时为空字符串
    pub fn alert_type(&self) -> String {
        self.alert
            .map(|a| a.message().to_string())
            .unwrap_or_default()
    }
}

pub fn summarize(detections: &[Detection]) -> FireSummary {
    let mut summary = FireSummary::default();
    for d in detections {
        if d.confidence <= MIN_CONFIDENCE {
            continue;
        }
        let Some(hazard) = Hazard::from_label(&d.label) else {
            continue;
        };
        match hazard {
            Hazard::Fire => summary.fire_count += 1,
            Hazard::Smoke => summary.smoke_count += 1,
        }

        let alert = Alert {
            hazard,
            confidence: d.confidence,
        };
        // 只有更严重的检测才替换, 平局保留先出现的
        let replace = summary
            .alert
            .map_or(true, |current| alert.severity_cmp(&current) == Ordering::Greater);
        if replace {
            summary.alert = Some(alert);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bbox;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection {
            class_id: 0,
            label: label.to_string(),
            confidence,
            bbox: Bbox::new(0.0, 0.0, 10.0, 10.0, 0, confidence),
        }
    }

    #[test]
    fn test_no_detections() {
        let s = summarize(&[]);
        assert_eq!(s.fire_count, 0);
        assert_eq!(s.smoke_count, 0);
        assert_eq!(s.alert_type(), "");
    }

    #[test]
    fn test_threshold_is_strict() {
        let s = summarize(&[det("fire", 0.55), det("smoke", 0.55)]);
        assert_eq!(s.fire_count, 0);
        assert_eq!(s.smoke_count, 0);
        assert_eq!(s.alert_type(), "");
    }

    #[test]
    fn test_severe_threshold_is_strict() {
        assert_eq!(
            summarize(&[det("fire", 0.6)]).alert_type(),
            "Warning: Fire Detected"
        );
        assert_eq!(
            summarize(&[det("smoke", 0.6)]).alert_type(),
            "Warning: Smoke Detected"
        );
        assert_eq!(
            summarize(&[det("fire", 0.61)]).alert_type(),
            "Emergency: Fire Detected"
        );
        assert_eq!(
            summarize(&[det("smoke", 0.61)]).alert_type(),
            "Caution: Smoke Detected"
        );
    }

    #[test]
    fn test_fire_outranks_smoke_regardless_of_order() {
        let s = summarize(&[det("fire", 0.58), det("smoke", 0.95)]);
        assert_eq!(s.fire_count, 1);
        assert_eq!(s.smoke_count, 1);
        assert_eq!(s.alert_type(), "Warning: Fire Detected");

        let s = summarize(&[det("smoke", 0.95), det("fire", 0.58)]);
        assert_eq!(s.alert_type(), "Warning: Fire Detected");
    }

    #[test]
    fn test_higher_confidence_wins_within_class() {
        let s = summarize(&[det("fire", 0.9), det("fire", 0.57)]);
        assert_eq!(s.fire_count, 2);
        assert_eq!(s.alert_type(), "Emergency: Fire Detected");
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let s = summarize(&[det("Fire", 0.7), det("SMOKE", 0.7), det("person", 0.99)]);
        assert_eq!(s.fire_count, 1);
        assert_eq!(s.smoke_count, 1);
    }
}
