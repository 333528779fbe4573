//! 日志系统初始化模块
//!
//! 控制台输出（文本或JSON）加上可选的按天滚动日志文件

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::llcommon::{AppError, LogFormat, LoggingConfig, Result};

/// 构建过滤器：RUST_LOG 优先，否则使用配置的级别并压低依赖库的噪音
pub fn build_env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},hyper=warn,aws_config=warn,aws_smithy_runtime=warn",
            log_level
        ))
    })
}

/// 初始化日志系统
///
/// 返回文件写入线程的 guard，需要在 main 中一直持有
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let console_layer = match config.format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().flatten_event(true).boxed(),
    };

    let (file_layer, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "log_lookup.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(console_layer.with_filter(build_env_filter(&config.log_level)))
        .with(file_layer.map(|layer| layer.with_filter(build_env_filter(&config.log_level))))
        .try_init()
        .map_err(|e| AppError::ConfigError(format!("初始化日志系统失败: {}", e)))?;

    Ok(guard)
}
