// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime 推理后端
// 负责: 会话构建、执行设备选择、输入尺寸与类别元数据读取

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use ndarray::{Array, IxDyn};
use once_cell::sync::Lazy;
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
    TensorRTExecutionProvider,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Value, ValueType};
use regex::Regex;
use tracing::{debug, info, warn};

/// 模型未声明静态输入尺寸时使用的默认边长
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// 执行设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub ep: OrtEP,
    pub trt_fp16: bool,
    pub intra_threads: usize,
    /// (height, width), None 表示沿用模型自身尺寸
    pub image_size: (Option<u32>, Option<u32>),
}

pub struct OrtBackend {
    // Session::run 需要独占访问, 并发请求在此串行
    session: Mutex<Session>,
    input_name: String,
    ep: OrtEP,
    height: u32,
    width: u32,
    nc: Option<u32>,
    names: Option<Vec<String>>,
    author: Option<String>,
    version: Option<String>,
}

impl std::fmt::Debug for OrtBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtBackend")
            .field("input_name", &self.input_name)
            .field("ep", &self.ep)
            .field("height", &self.height)
            .field("width", &self.width)
            .field("nc", &self.nc)
            .finish_non_exhaustive()
    }
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let path = Path::new(&config.f);
        if !path.exists() {
            anyhow::bail!("Model not found: {}", path.display());
        }

        let mut eps: Vec<ExecutionProviderDispatch> = Vec::new();
        match config.ep {
            OrtEP::Trt(device_id) => eps.push(
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .with_fp16(config.trt_fp16)
                    .build(),
            ),
            OrtEP::CUDA(device_id) => eps.push(
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ),
            OrtEP::CPU => {}
        }
        eps.push(CPUExecutionProvider::default().build());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers(eps)
            .context("Failed to set execution providers")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| anyhow!("Model {} has no inputs", path.display()))?;
        let input_name = input.name.clone();
        let input_dims = tensor_dims(&input.input_type);
        debug!("Model input `{}` dims: {:?}", input_name, input_dims);

        // NCHW, 动态维度为 -1
        let static_dim = |i: usize| {
            input_dims
                .get(i)
                .copied()
                .filter(|&d| d > 0)
                .map(|d| d as u32)
        };
        let height = config
            .image_size
            .0
            .or_else(|| static_dim(2))
            .unwrap_or(DEFAULT_INPUT_SIZE);
        let width = config
            .image_size
            .1
            .or_else(|| static_dim(3))
            .unwrap_or(DEFAULT_INPUT_SIZE);

        // YOLOv8 detect 输出: [batch, 4 + nc, anchors]
        let nc = session
            .outputs
            .first()
            .map(|output| tensor_dims(&output.output_type))
            .and_then(|dims| dims.get(1).copied())
            .filter(|&d| d > 4)
            .map(|d| (d - 4) as u32);

        let (names, author, version) = match session.metadata() {
            Ok(metadata) => (
                metadata
                    .custom("names")
                    .ok()
                    .flatten()
                    .map(|raw| parse_names(&raw)),
                metadata.custom("author").ok().flatten(),
                metadata.custom("version").ok().flatten(),
            ),
            Err(e) => {
                warn!("Failed to read metadata of {}: {}", path.display(), e);
                (None, None, None)
            }
        };

        info!(
            "Model loaded: {} ({:?}, {}x{}, nc={:?})",
            path.display(),
            config.ep,
            width,
            height,
            nc
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            ep: config.ep,
            height,
            width,
            nc,
            names,
            author,
            version,
        })
    }

    pub fn run(&self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = std::time::Instant::now();
        let input = Value::from_array(xs).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .context("Inference failed")?;

        let mut ys = Vec::with_capacity(outputs.len());
        for i in 0..outputs.len() {
            let y = outputs[i]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            ys.push(y.into_owned());
        }
        if profile {
            debug!("[ORT Inference]: {:?}", t.elapsed());
        }
        Ok(ys)
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn nc(&self) -> Option<u32> {
        self.nc
    }

    pub fn names(&self) -> Option<Vec<String>> {
        self.names.clone()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

fn tensor_dims(value_type: &ValueType) -> Vec<i64> {
    match value_type {
        ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
        _ => Vec::new(),
    }
}

static NAME_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).expect("valid names regex")
});

/// 解析 Ultralytics 导出时写入的 `names` 元数据
///
/// 形如 `{0: 'fire', 1: 'smoke'}`, 缺失的编号以 `class{id}` 占位
pub fn parse_names(raw: &str) -> Vec<String> {
    let mut entries: Vec<(usize, String)> = NAME_ENTRY
        .captures_iter(raw)
        .filter_map(|cap| {
            let id = cap.get(1)?.as_str().parse::<usize>().ok()?;
            let name = cap.get(2).or_else(|| cap.get(3))?.as_str().to_string();
            Some((id, name))
        })
        .collect();
    entries.sort_by_key(|(id, _)| *id);

    let len = entries.last().map(|(id, _)| id + 1).unwrap_or(0);
    let mut names: Vec<String> = (0..len).map(|i| format!("class{}", i)).collect();
    for (id, name) in entries {
        names[id] = name;
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_ultralytics_dict() {
        let names = parse_names("{0: 'fire', 1: 'smoke'}");
        assert_eq!(names, vec!["fire".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn test_parse_names_double_quotes_and_gaps() {
        let names = parse_names(r#"{2: "people", 0: "head"}"#);
        assert_eq!(names, vec!["head", "class1", "people"]);
    }

    #[test]
    fn test_parse_names_garbage() {
        assert!(parse_names("not a dict").is_empty());
    }

    #[test]
    fn test_build_missing_model() {
        let err = OrtBackend::build(OrtConfig {
            f: "does/not/exist.onnx".to_string(),
            ep: OrtEP::CPU,
            trt_fp16: false,
            intra_threads: 1,
            image_size: (None, None),
        })
        .unwrap_err();
        assert!(err.to_string().contains("Model not found"));
    }
}
