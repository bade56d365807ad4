/// 检测系统数据结构定义
use crate::Bbox;

/// 单个检测结果: 类别、置信度、原图坐标下的检测框
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
    pub bbox: Bbox,
}

impl Detection {
    /// 用模型的类别表解析类别名, 未知编号记为 `class{id}`
    pub fn from_bbox(bbox: Bbox, names: &[String]) -> Self {
        let class_id = bbox.id();
        let label = names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class{}", class_id));
        Self {
            class_id,
            label,
            confidence: bbox.confidence(),
            bbox,
        }
    }

    /// 类别名比较 (大小写不敏感)
    pub fn is(&self, label: &str) -> bool {
        self.label.eq_ignore_ascii_case(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bbox_resolves_label() {
        let names = vec!["fire".to_string(), "smoke".to_string()];
        let d = Detection::from_bbox(Bbox::new(0.0, 0.0, 5.0, 5.0, 1, 0.8), &names);
        assert_eq!(d.label, "smoke");
        assert_eq!(d.class_id, 1);
        assert_eq!(d.confidence, 0.8);
    }

    #[test]
    fn test_unknown_class() {
        let d = Detection::from_bbox(Bbox::new(0.0, 0.0, 5.0, 5.0, 7, 0.5), &[]);
        assert_eq!(d.label, "class7");
    }

    #[test]
    fn test_is_case_insensitive() {
        let d = Detection::from_bbox(
            Bbox::new(0.0, 0.0, 1.0, 1.0, 0, 0.5),
            &["People".to_string()],
        );
        assert!(d.is("people"));
        assert!(!d.is("person"));
    }
}
