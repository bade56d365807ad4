// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型
// 包含: 模型加载、预处理、推理、后处理

use anyhow::{bail, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array, Axis, IxDyn};
use tracing::{debug, info};

use crate::{non_max_suppression, Bbox, ModelArgs, OrtBackend, OrtConfig, OrtEP};

/// 预处理填充色
const PAD_VALUE: f32 = 144.0 / 255.0;

/// YOLOv8 完整模型结构
pub struct YOLOv8 {
    engine: OrtBackend,
    postprocessor: YOLOv8Postprocessor,
    names: Vec<String>,
    profile: bool,
}

impl YOLOv8 {
    /// 从配置创建 YOLOv8 模型
    pub fn new(config: ModelArgs) -> Result<Self> {
        // build ort engine
        let ort_args = OrtConfig {
            f: config.model,
            ep: config.ep,
            trt_fp16: config.fp16,
            intra_threads: config.intra_threads,
            image_size: (config.height, config.width),
        };
        let engine = OrtBackend::build(ort_args)?;

        // class names
        let names = engine.names().unwrap_or_default();
        let nc = match engine.nc() {
            Some(nc) => nc as usize,
            None if !names.is_empty() => names.len(),
            None => bail!("Failed to get num_classes from model outputs or metadata"),
        };

        let postprocessor = YOLOv8Postprocessor::new(YOLOv8Config::new(
            nc,
            engine.width() as usize,
            engine.height() as usize,
            config.conf,
            config.iou,
        ));

        Ok(Self {
            engine,
            postprocessor,
            names,
            profile: config.profile,
        })
    }

    pub fn preprocess(&self, xs: &[DynamicImage]) -> Result<Array<f32, IxDyn>> {
        Ok(preprocess(xs, self.width(), self.height()))
    }

    pub fn run(&self, xs: &[DynamicImage]) -> Result<Vec<Vec<Bbox>>> {
        let t_pre = std::time::Instant::now();
        let xs_ = self.preprocess(xs)?;
        if self.profile {
            debug!("[Model Preprocess]: {:?}", t_pre.elapsed());
        }

        let t_run = std::time::Instant::now();
        let ys = self.engine.run(xs_, self.profile)?;
        if self.profile {
            debug!("[Model Inference]: {:?}", t_run.elapsed());
        }

        let t_post = std::time::Instant::now();
        let ys = self.postprocessor.postprocess(&ys, xs)?;
        if self.profile {
            debug!("[Model Postprocess]: {:?}", t_post.elapsed());
        }

        Ok(ys)
    }

    pub fn summary(&self) {
        info!(
            "Summary: EP: {:?}{} | {}x{} | nc: {}, conf: {}, iou: {}{} | names: {:?}",
            self.engine.ep(),
            if let OrtEP::CPU = self.engine.ep() {
                ""
            } else {
                " (May still fall back to CPU)"
            },
            self.width(),
            self.height(),
            self.nc(),
            self.conf(),
            self.iou(),
            match self.engine.author().zip(self.engine.version()) {
                Some((author, ver)) => format!(" ({} {})", author, ver),
                None => String::new(),
            },
            self.names,
        );
    }

    pub fn conf(&self) -> f32 {
        self.postprocessor.config.conf
    }

    pub fn iou(&self) -> f32 {
        self.postprocessor.config.iou
    }

    pub fn width(&self) -> u32 {
        self.engine.width()
    }

    pub fn height(&self) -> u32 {
        self.engine.height()
    }

    pub fn nc(&self) -> usize {
        self.postprocessor.config.nc
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// 等比缩放到 (width, height) 左上角, 其余填充, 输出 NCHW
pub fn preprocess(xs: &[DynamicImage], width: u32, height: u32) -> Array<f32, IxDyn> {
    let mut ys = Array::ones((xs.len(), 3, height as usize, width as usize)).into_dyn();
    ys.fill(PAD_VALUE);
    for (idx, x) in xs.iter().enumerate() {
        let (w0, h0) = x.dimensions();
        if w0 == 0 || h0 == 0 {
            continue;
        }
        let (_, w_new, h_new) = scale_wh(w0 as f32, h0 as f32, width as f32, height as f32);
        let img = x.resize_exact(
            (w_new as u32).clamp(1, width),
            (h_new as u32).clamp(1, height),
            image::imageops::FilterType::Triangle,
        );

        for (x, y, rgb) in img.pixels() {
            let x = x as usize;
            let y = y as usize;
            let [r, g, b, _] = rgb.0;
            ys[[idx, 0, y, x]] = (r as f32) / 255.0;
            ys[[idx, 1, y, x]] = (g as f32) / 255.0;
            ys[[idx, 2, y, x]] = (b as f32) / 255.0;
        }
    }
    ys
}

/// YOLOv8 后处理配置
#[derive(Debug, Clone)]
pub struct YOLOv8Config {
    pub nc: usize,
    pub conf: f32,
    pub iou: f32,
    pub width: usize,
    pub height: usize,
}

impl YOLOv8Config {
    pub fn new(nc: usize, width: usize, height: usize, conf: f32, iou: f32) -> Self {
        Self {
            nc,
            conf,
            iou,
            width,
            height,
        }
    }
}

/// YOLOv8 后处理器
///
/// 输入 `[batch, 4 + nc, anchors]`, 每列为 `cx, cy, w, h, cls...` (模型输入坐标系)
pub struct YOLOv8Postprocessor {
    config: YOLOv8Config,
}

impl YOLOv8Postprocessor {
    pub fn new(config: YOLOv8Config) -> Self {
        Self { config }
    }

    pub fn postprocess(
        &self,
        xs: &[Array<f32, IxDyn>],
        xs0: &[DynamicImage],
    ) -> Result<Vec<Vec<Bbox>>> {
        const CXYWH_OFFSET: usize = 4;

        let Some(preds) = xs.first() else {
            bail!("Model returned no outputs");
        };
        let shape = preds.shape();
        if shape.len() != 3 || shape[1] < CXYWH_OFFSET + self.config.nc {
            bail!(
                "Unexpected output shape: {:?}, expected [batch, {}, anchors]",
                shape,
                CXYWH_OFFSET + self.config.nc
            );
        }
        if shape[0] != xs0.len() {
            bail!(
                "Output batch {} does not match {} input images",
                shape[0],
                xs0.len()
            );
        }

        let mut ys = Vec::with_capacity(xs0.len());
        for (idx, anchor) in preds.axis_iter(Axis(0)).enumerate() {
            let width_original = xs0[idx].width() as f32;
            let height_original = xs0[idx].height() as f32;
            if width_original == 0.0 || height_original == 0.0 {
                ys.push(Vec::new());
                continue;
            }
            let ratio = (self.config.width as f32 / width_original)
                .min(self.config.height as f32 / height_original);

            let mut data: Vec<Bbox> = Vec::new();
            for pred in anchor.axis_iter(Axis(1)) {
                let bbox = pred.slice(s![0..CXYWH_OFFSET]);
                let clss = pred.slice(s![CXYWH_OFFSET..CXYWH_OFFSET + self.config.nc]);

                let Some((id, &confidence)) = clss
                    .into_iter()
                    .enumerate()
                    .reduce(|max, x| if x.1 > max.1 { x } else { max })
                else {
                    continue;
                };

                if confidence <= self.config.conf {
                    continue;
                }

                let cx = bbox[0] / ratio;
                let cy = bbox[1] / ratio;
                let w = bbox[2] / ratio;
                let h = bbox[3] / ratio;
                let x = (cx - w / 2.).max(0.0f32).min(width_original);
                let y = (cy - h / 2.).max(0.0f32).min(height_original);
                data.push(Bbox::new(
                    x,
                    y,
                    w.min(width_original - x),
                    h.min(height_original - y),
                    id,
                    confidence,
                ));
            }

            non_max_suppression(&mut data, self.config.iou);
            ys.push(data);
        }

        Ok(ys)
    }
}
