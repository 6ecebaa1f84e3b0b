//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，密钥类配置只从环境变量读取：
//! - FINNHUB_API_KEY：报价接口密钥
//! - CRON_SECRET：定时任务接口的 Bearer Token
//! - REDIS_URL：共享缓存地址（不设置则使用进程内存）
//! - APP_ENV：运行环境，production 时严格校验定时任务 Token
//! - DATA_DIR：数据目录

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::quotes::{FetchStrategy, FINNHUB_BASE_URL};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
    /// 运行环境
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// 报价接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// 接口地址
    #[serde(default = "default_quote_base_url")]
    pub base_url: String,
    /// 单次请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 两次请求之间的间隔（毫秒），免费额度每分钟 60 次
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
    /// 定时任务拉取策略
    #[serde(default)]
    pub strategy: FetchStrategy,
    /// 缓存全部失效时是否在请求中直接拉取
    #[serde(default = "default_true")]
    pub direct_fetch_on_miss: bool,
    /// API Key（仅从环境变量读取）
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 本地缓存有效期（秒）
    #[serde(default = "default_local_ttl")]
    pub local_ttl_secs: u64,
    /// 共享缓存有效期（秒）
    #[serde(default = "default_shared_ttl")]
    pub shared_ttl_secs: u64,
    /// Redis 地址（仅从环境变量读取）
    #[serde(skip)]
    pub redis_url: Option<String>,
}

/// 数据文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// 数据目录，包含 players.json、currentPrices.json 和 history/
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    /// 每名选手的持仓数量
    #[serde(default = "default_stocks_per_player")]
    pub stocks_per_player: usize,
}

/// 定时任务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CronConfig {
    /// Bearer Token（仅从环境变量读取）
    #[serde(skip)]
    pub secret: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_environment() -> String { "development".to_string() }
fn default_quote_base_url() -> String { FINNHUB_BASE_URL.to_string() }
fn default_timeout() -> u64 { 10 }
fn default_connect_timeout() -> u64 { 5 }
fn default_request_delay() -> u64 { 1000 }
fn default_true() -> bool { true }
fn default_local_ttl() -> u64 { 60 }
fn default_shared_ttl() -> u64 { 300 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_stocks_per_player() -> usize { 10 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            environment: default_environment(),
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_quote_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            request_delay_ms: default_request_delay(),
            strategy: FetchStrategy::default(),
            direct_fetch_on_miss: true,
            api_key: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_ttl_secs: default_local_ttl(),
            shared_ttl_secs: default_shared_ttl(),
            redis_url: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            stocks_per_player: default_stocks_per_player(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// 读取非空环境变量
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl QuoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl CacheConfig {
    pub fn local_ttl(&self) -> Duration {
        Duration::from_secs(self.local_ttl_secs)
    }

    pub fn shared_ttl(&self) -> Duration {
        Duration::from_secs(self.shared_ttl_secs)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，文件不存在则使用默认值，最后应用环境变量
    ///
    /// 日志尚未初始化，返回加载来源供调用方记录
    pub fn load() -> anyhow::Result<(Self, Option<&'static str>)> {
        let config_paths = ["config.json", "config/config.json"];

        let mut source = None;
        let mut config = Self::default();
        for path in config_paths {
            if Path::new(path).exists() {
                config = Self::from_file(path)
                    .map_err(|e| anyhow::anyhow!("加载配置文件 {} 失败: {}", path, e))?;
                source = Some(path);
                break;
            }
        }

        config.apply_env();
        Ok((config, source))
    }

    /// 应用环境变量
    pub fn apply_env(&mut self) {
        self.quote.api_key = env_non_empty("FINNHUB_API_KEY");
        self.cron.secret = env_non_empty("CRON_SECRET");
        self.cache.redis_url = env_non_empty("REDIS_URL");
        if let Some(environment) = env_non_empty("APP_ENV") {
            self.server.environment = environment;
        }
        if let Some(dir) = env_non_empty("DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn players_path(&self) -> PathBuf {
        self.data.dir.join("players.json")
    }
}
