//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BEELINE__*` 覆盖
//! （双下划线表示嵌套，如 `BEELINE__CATALOG__INSTANCE_URL=https://...`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub webhook: WebhookSection,
    #[serde(default)]
    pub poll: PollSection,
}

/// [app] 段：服务名与监听端口
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            port: default_port(),
        }
    }
}

/// [catalog] 段：目录服务实例地址、Basic 认证与请求超时
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    /// 实例根地址，如 https://example.service-now.com
    pub instance_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            instance_url: None,
            username: None,
            password: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// [webhook] 段：来源校验共享密钥（未设置时拒绝所有带签名头的请求）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhookSection {
    pub secret: Option<String>,
}

/// [poll] 段：提交后的工单状态轮询
#[derive(Debug, Clone, Deserialize)]
pub struct PollSection {
    /// 两次轮询的间隔（秒）
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_attempts() -> u32 {
    24
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            max_attempts: default_poll_attempts(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            catalog: CatalogSection::default(),
            webhook: WebhookSection::default(),
            poll: PollSection::default(),
        }
    }
}

/// 加载配置：config/default.toml（可缺省）→ 可选的覆盖文件 → 环境变量
///
/// 单二进制部署，基础配置只认 config/default.toml 一个位置；缺省时全部
/// 字段走默认值。`config_path` 用于测试或运维指定覆盖文件，最后叠加
/// 环境变量 BEELINE__*（双下划线表示嵌套键）。
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false));

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    builder
        .add_source(
            config::Environment::with_prefix("BEELINE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
