//! 日志查询服务
//!
//! 按 request id / correlation id / 环境 / 时间窗口查询 CloudWatch 日志，
//! 以高亮的JSON显示结果

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use log_lookup::llcommon::config::DEFAULT_CONFIG_PATH;
use log_lookup::llcommon::logging_setup::init_logging;
use log_lookup::llcommon::LogLookupConfig;
use log_lookup::llserver::{web, AppContext};

#[derive(Parser)]
#[command(name = "log_lookup")]
#[command(about = "按请求标识查询 CloudWatch 日志的 Web 前端")]
#[command(version)]
struct Cli {
    /// 配置文件路径，默认读取 CONFIG_PATH 环境变量或 config/LogLookupConfig.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Web服务端口，优先于配置文件和 PORT 环境变量
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var("CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = if config_path.exists() {
        LogLookupConfig::from_file(&config_path)
            .with_context(|| format!("加载配置文件失败: {}", config_path.display()))?
    } else {
        eprintln!("配置文件不存在: {}，使用默认配置", config_path.display());
        LogLookupConfig::default()
    };
    config.apply_env_overrides()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _log_guard = init_logging(&config.logging)?;
    info!("🚀 启动日志查询服务");
    info!(
        "📋 配置: 端口={}, 日志组={}, profile={}, 角色环境={:?}",
        config.server.port,
        config.backend.log_group,
        config.backend.profile,
        config.backend.roles.keys().collect::<Vec<_>>()
    );

    let ctx = Arc::new(AppContext::from_config(&config).await?);

    let ip: IpAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("无效的监听地址: {}", config.server.bind_addr))?;
    web::start_web_server(SocketAddr::new(ip, config.server.port), ctx).await?;

    Ok(())
}
