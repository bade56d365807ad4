// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 检测结果绘制: 检测框 + "类别 置信度" 标签

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::info;

use crate::Detection;

const BRIGHT_COLORS: [(u8, u8, u8); 12] = [
    (255, 0, 0),     // 红色
    (0, 255, 0),     // 绿色
    (0, 0, 255),     // 蓝色
    (255, 255, 0),   // 黄色
    (255, 0, 255),   // 品红
    (0, 255, 255),   // 青色
    (255, 128, 0),   // 橙色
    (255, 0, 128),   // 粉红
    (128, 255, 0),   // 黄绿
    (0, 128, 255),   // 天蓝
    (255, 255, 255), // 白色
    (128, 0, 255),   // 紫色
];

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// 无字体时标签底板的高度
const PLATE_HEIGHT_NO_FONT: u32 = 6;

pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    /// 从 TTF/OTF 文件加载字体, 未配置时只画框
    pub fn from_font_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("未配置字体, 标注只绘制检测框");
            return Ok(Self::new(None));
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| anyhow!("Invalid font {}: {}", path.display(), e))?;
        info!("标注字体: {}", path.display());
        Ok(Self::new(Some(font)))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn color(class_id: usize) -> Rgb<u8> {
        let (r, g, b) = BRIGHT_COLORS[class_id % BRIGHT_COLORS.len()];
        Rgb([r, g, b])
    }

    /// 在图像副本上绘制全部检测结果
    pub fn annotate(&self, image: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        let (w, h) = canvas.dimensions();
        if w == 0 || h == 0 {
            return canvas;
        }

        let line_width = (((w + h) as f32 / 2.0 * 0.003).round() as u32).max(2);
        let scale = PxScale::from((line_width as f32 * 6.0).max(12.0));

        for d in detections {
            let color = Self::color(d.class_id);
            let x0 = d.bbox.xmin().round() as i32;
            let y0 = d.bbox.ymin().round() as i32;
            let bw = d.bbox.width().round() as u32;
            let bh = d.bbox.height().round() as u32;

            // 线宽通过向内收缩的多个矩形实现
            for i in 0..line_width {
                let (iw, ih) = (bw.saturating_sub(2 * i), bh.saturating_sub(2 * i));
                if iw == 0 || ih == 0 {
                    break;
                }
                let rect = Rect::at(x0 + i as i32, y0 + i as i32).of_size(iw, ih);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            let caption = format!("{} {:.2}", d.label, d.confidence);
            let (plate_w, plate_h) = match &self.font {
                Some(font) => {
                    let (tw, th) = text_size(scale, font, &caption);
                    (tw + 2 * line_width, th + 2 * line_width)
                }
                None => (bw.max(1), PLATE_HEIGHT_NO_FONT),
            };
            // 标签放在框上方, 顶部空间不够时放到框内
            let plate_y = if y0 >= plate_h as i32 {
                y0 - plate_h as i32
            } else {
                y0
            };
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(x0, plate_y).of_size(plate_w.max(1), plate_h.max(1)),
                color,
            );
            if let Some(font) = &self.font {
                draw_text_mut(
                    &mut canvas,
                    TEXT_COLOR,
                    x0 + line_width as i32,
                    plate_y + line_width as i32,
                    scale,
                    font,
                    &caption,
                );
            }
        }

        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bbox;

    fn det(class_id: usize, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection {
            class_id,
            label: "fire".to_string(),
            confidence: 0.9,
            bbox: Bbox::new(x, y, w, h, class_id, 0.9),
        }
    }

    #[test]
    fn test_no_detections_is_a_copy() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([9, 9, 9])));
        let out = Annotator::new(None).annotate(&img, &[]);
        assert_eq!(out.dimensions(), (40, 30));
        assert!(out.pixels().all(|p| *p == Rgb([9, 9, 9])));
    }

    #[test]
    fn test_box_is_drawn_in_class_color() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(100, 100));
        let out = Annotator::new(None).annotate(&img, &[det(1, 20.0, 30.0, 40.0, 40.0)]);
        let green = Annotator::color(1);
        // 左边框与底边框
        assert_eq!(out.get_pixel(20, 50), &green);
        assert_eq!(out.get_pixel(40, 69), &green);
        // 框内部不变
        assert_eq!(out.get_pixel(40, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_outside_image_does_not_panic() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let out = Annotator::new(None).annotate(
            &img,
            &[det(0, 8.0, 8.0, 50.0, 50.0), det(2, 0.0, 0.0, 0.0, 0.0)],
        );
        assert_eq!(out.dimensions(), (10, 10));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(Annotator::from_font_file(Some(Path::new("no/such/font.ttf"))).is_err());
        assert!(!Annotator::from_font_file(None).unwrap().has_font());
    }
}
