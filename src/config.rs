//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置；
//! 各数据源的 API Key 从环境变量读取，缺失时退回演示值

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

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
}

/// 上游请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 请求超时时间（秒），超时按上游错误处理
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 上游请求配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 自选股/持仓使用的默认用户 id（当前无认证体系）
    #[serde(default = "default_user_id")]
    pub default_user_id: i64,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 8 }
fn default_connect_timeout() -> u64 { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_user_id() -> i64 { 1 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            log: LogConfig::default(),
            default_user_id: default_user_id(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 数据源 API Key 配置
///
/// 全部来自环境变量；缺失不会阻止进程启动，
/// 只会导致对应数据源的单次请求失败
#[derive(Debug, Clone)]
pub struct ProviderKeys {
    /// Alpha Vantage API Key
    pub alpha_vantage: String,
    /// Finnhub API Key
    pub finnhub: String,
    /// Twelve Data API Key
    pub twelve_data: String,
}

impl ProviderKeys {
    /// 从环境变量读取各数据源的 API Key
    pub fn from_env() -> Self {
        let alpha_vantage = env::var("ALPHA_VANTAGE_API_KEY").unwrap_or_else(|_| {
            log::warn!("未设置 ALPHA_VANTAGE_API_KEY 环境变量，使用演示 Key");
            "demo".to_string()
        });
        let finnhub = env::var("FINNHUB_API_KEY").unwrap_or_else(|_| {
            log::warn!("未设置 FINNHUB_API_KEY 环境变量，Finnhub 请求将失败");
            String::new()
        });
        let twelve_data = env::var("TWELVE_DATA_API_KEY").unwrap_or_else(|_| {
            log::warn!("未设置 TWELVE_DATA_API_KEY 环境变量，使用演示 Key");
            "demo".to_string()
        });

        Self {
            alpha_vantage,
            finnhub,
            twelve_data,
        }
    }
}
