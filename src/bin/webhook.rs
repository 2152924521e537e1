//! Beeline Webhook 服务
//!
//! 接收语音平台的逐条话语，驱动目录请求的槽位填充对话。
//!
//! 环境变量（覆盖 config/default.toml）：
//! - BEELINE__CATALOG__INSTANCE_URL: 目录服务实例地址（必填）
//! - BEELINE__CATALOG__USERNAME / BEELINE__CATALOG__PASSWORD: Basic 认证
//! - BEELINE__WEBHOOK__SECRET: Webhook 共享密钥（可选）
//! - BEELINE__APP__PORT: 监听端口（默认 3000）
//!
//! 启动: cargo run --bin beeline-webhook

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use beeline::catalog::HttpCatalogClient;
use beeline::config::load_config;
use beeline::dialog::{DialogMachine, MemorySessionStore, PollPolicy};
use beeline::integrations::voice::{create_router, VoiceState};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let config = load_config(None)?;

    let instance_url = config
        .catalog
        .instance_url
        .clone()
        .context("catalog.instance_url must be set (BEELINE__CATALOG__INSTANCE_URL)")?;

    let catalog = HttpCatalogClient::new(
        &instance_url,
        config.catalog.username.clone(),
        config.catalog.password.clone(),
        Duration::from_secs(config.catalog.request_timeout_secs),
    )?;

    let machine = DialogMachine::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(catalog),
        PollPolicy {
            interval: Duration::from_secs(config.poll.interval_secs),
            max_attempts: config.poll.max_attempts,
        },
    );

    let state = Arc::new(VoiceState {
        machine,
        webhook_secret: config.webhook.secret.clone(),
    });

    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.app.port));
    tracing::info!("Beeline webhook listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
