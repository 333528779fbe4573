//! 日志查询服务配置模块

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::llcommon::{AppError, Environment, Result};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/LogLookupConfig.toml";

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_profile() -> String {
    "uneet-dev".to_string()
}

fn default_region() -> String {
    "ap-southeast-1".to_string()
}

fn default_log_group() -> String {
    "/aws/lambda/ut_lambda2sqs_process".to_string()
}

fn default_session_name() -> String {
    "log-lookup".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 日志查询服务配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogLookupConfig {
    /// Web服务配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 日志后端配置
    #[serde(default)]
    pub backend: BackendConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Web服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// 监听端口，环境变量 PORT 优先
    #[serde(default = "default_port")]
    pub port: u16,

    /// 页面模板目录
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
}

/// 日志后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// 共享凭证文件中的 profile 名称
    #[serde(default = "default_profile")]
    pub profile: String,

    /// 区域
    #[serde(default = "default_region")]
    pub region: String,

    /// 查询的日志组
    #[serde(default = "default_log_group")]
    pub log_group: String,

    /// 扮演角色时使用的会话名
    #[serde(default = "default_session_name")]
    pub session_name: String,

    /// 环境名 -> 角色 ARN；未配置的环境使用基础身份
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 控制台输出格式
    #[serde(default)]
    pub format: LogFormat,

    /// 滚动日志文件目录，不设置则只输出到控制台
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            templates_dir: default_templates_dir(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            region: default_region(),
            log_group: default_log_group(),
            session_name: default_session_name(),
            roles: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            format: LogFormat::Text,
            log_dir: None,
        }
    }
}

impl BackendConfig {
    /// 查找环境对应的角色
    pub fn role_for(&self, env: Environment) -> Option<&str> {
        self.roles.get(env.as_str()).map(String::as_str)
    }
}

impl LogLookupConfig {
    /// 从文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// 从TOML文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("解析配置文件失败: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆盖：PORT 覆盖端口，UP_STAGE 存在时使用JSON日志
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            if !port.trim().is_empty() {
                self.server.port = port
                    .trim()
                    .parse()
                    .map_err(|e| AppError::ConfigError(format!("无效的 PORT 环境变量 {:?}: {}", port, e)))?;
            }
        }
        if std::env::var("UP_STAGE").map(|s| !s.is_empty()).unwrap_or(false) {
            self.logging.format = LogFormat::Json;
        }
        self.validate()
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::ConfigError("端口必须大于0".to_string()));
        }

        if self.backend.log_group.trim().is_empty() {
            return Err(AppError::ConfigError("日志组不能为空".to_string()));
        }

        if self.backend.profile.trim().is_empty() {
            return Err(AppError::ConfigError("profile 不能为空".to_string()));
        }

        if self.backend.region.trim().is_empty() {
            return Err(AppError::ConfigError("region 不能为空".to_string()));
        }

        for (env, role) in &self.backend.roles {
            if Environment::ALL.iter().all(|e| e.as_str() != env.as_str()) {
                return Err(AppError::ConfigError(format!("角色表中存在未知环境: {}", env)));
            }
            if role.trim().is_empty() {
                return Err(AppError::ConfigError(format!("环境 {} 的角色 ARN 为空", env)));
            }
        }

        Ok(())
    }
}
