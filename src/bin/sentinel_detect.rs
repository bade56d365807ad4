/// 火焰/烟雾 + 人群密度检测服务
///
/// 启动流程:
/// 1. 解析参数, 初始化日志
/// 2. 加载人群模型与火焰/烟雾模型 (进程内只加载一次)
/// 3. 启动 HTTP 服务, Ctrl-C 优雅退出
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_detect::api::{self, AppState, ServiceSettings};
use sentinel_detect::{Annotator, Args, OnnxDetector};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("🚀 检测服务启动");
    info!("📦 人群模型: {}", args.crowd_model);
    info!("🔥 火焰模型: {}", args.fire_model);

    let crowd = OnnxDetector::load("crowd", args.model_args(&args.crowd_model))?;
    let fire = OnnxDetector::load("fire", args.model_args(&args.fire_model))?;
    let annotator = Annotator::from_font_file(args.font.as_deref())?;

    let state = AppState::new(
        Arc::new(crowd),
        Arc::new(fire),
        annotator,
        ServiceSettings {
            location: args.location.clone(),
            person_label: args.person_label.clone(),
        },
    );
    let app = api::router(state, args.max_body_bytes);

    let addr = args.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✅ 监听 http://{} (POST /detect)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("👋 检测服务已退出");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
    }
}
