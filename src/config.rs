// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 服务配置: 命令行参数, 均可由环境变量覆盖

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::OrtEP;

/// 火焰/烟雾 + 人群密度检测服务
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "火焰/烟雾与人群密度检测 HTTP 服务", long_about = None)]
pub struct Args {
    /// 监听地址
    #[arg(long, env = "DETECT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// 监听端口
    #[arg(long, env = "DETECT_PORT", default_value_t = 5001)]
    pub port: u16,

    /// 人群检测模型 (YOLOv8 ONNX)
    #[arg(long, env = "CROWD_MODEL", default_value = "models/crowd.onnx")]
    pub crowd_model: String,

    /// 火焰/烟雾检测模型 (YOLOv8 ONNX)
    #[arg(long, env = "FIRE_MODEL", default_value = "models/fire.onnx")]
    pub fire_model: String,

    /// 模型输出的置信度预过滤阈值
    #[arg(long, env = "DETECT_CONF", default_value_t = 0.25)]
    pub conf: f32,

    /// NMS IoU 阈值
    #[arg(long, env = "DETECT_IOU", default_value_t = 0.45)]
    pub iou: f32,

    /// 输入宽度, 默认取模型自身尺寸
    #[arg(long)]
    pub width: Option<u32>,

    /// 输入高度, 默认取模型自身尺寸
    #[arg(long)]
    pub height: Option<u32>,

    /// 使用 CUDA
    #[arg(long)]
    pub cuda: bool,

    /// 使用 TensorRT
    #[arg(long)]
    pub trt: bool,

    /// TensorRT 半精度
    #[arg(long)]
    pub fp16: bool,

    /// GPU 编号
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// ONNX Runtime intra-op 线程数
    #[arg(long, default_value_t = 4)]
    pub intra_threads: usize,

    /// 响应中的位置标签
    #[arg(long, env = "DETECT_LOCATION", default_value = "E Block")]
    pub location: String,

    /// 人群模型中"人"的类别名 (大小写不敏感)
    #[arg(long, default_value = "people")]
    pub person_label: String,

    /// 标注文字所用 TTF 字体, 不提供则只画框
    #[arg(long, env = "DETECT_FONT")]
    pub font: Option<PathBuf>,

    /// 请求体上限 (字节)
    #[arg(long, default_value_t = 20 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// 打印各阶段耗时 (debug 级别)
    #[arg(long)]
    pub profile: bool,
}

/// 单个模型的加载参数
#[derive(Debug, Clone)]
pub struct ModelArgs {
    pub model: String,
    pub ep: OrtEP,
    pub fp16: bool,
    pub intra_threads: usize,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub conf: f32,
    pub iou: f32,
    pub profile: bool,
}

impl Args {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn ep(&self) -> OrtEP {
        if self.trt {
            OrtEP::Trt(self.device_id)
        } else if self.cuda {
            OrtEP::CUDA(self.device_id)
        } else {
            OrtEP::CPU
        }
    }

    pub fn model_args(&self, model: &str) -> ModelArgs {
        ModelArgs {
            model: model.to_string(),
            ep: self.ep(),
            fp16: self.fp16,
            intra_threads: self.intra_threads,
            width: self.width,
            height: self.height,
            conf: self.conf,
            iou: self.iou,
            profile: self.profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sentinel-detect"]).unwrap();
        assert_eq!(args.port, 5001);
        assert_eq!(args.location, "E Block");
        assert_eq!(args.person_label, "people");
        assert_eq!(args.addr().to_string(), "0.0.0.0:5001");
        assert_eq!(args.ep(), OrtEP::CPU);
        assert!(args.font.is_none());
    }

    #[test]
    fn test_trt_wins_over_cuda() {
        let args = Args::try_parse_from([
            "sentinel-detect",
            "--cuda",
            "--trt",
            "--device-id",
            "1",
        ])
        .unwrap();
        assert_eq!(args.ep(), OrtEP::Trt(1));
    }

    #[test]
    fn test_model_args() {
        let args = Args::try_parse_from([
            "sentinel-detect",
            "--conf",
            "0.4",
            "--width",
            "320",
            "--fire-model",
            "weights/fire.onnx",
        ])
        .unwrap();
        let m = args.model_args(&args.fire_model);
        assert_eq!(m.model, "weights/fire.onnx");
        assert_eq!(m.conf, 0.4);
        assert_eq!(m.width, Some(320));
        assert_eq!(m.height, None);
    }
}
