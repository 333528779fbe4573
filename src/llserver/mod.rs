// 导出服务器相关模块
pub mod web;

use std::sync::Arc;

use crate::llcommon::{LogLookupConfig, Result};
use crate::lookup::cloudwatch::CloudWatchConnector;
use crate::lookup::{BackendConnector, LogSourceClient, LookupService, RecordRenderer};

pub use self::web::Views;

/// 请求处理器共享的上下文，启动时构建，之后只读
pub struct AppContext {
    pub views: Views,
    pub lookup: LookupService,
}

impl AppContext {
    pub fn new(views: Views, connector: Arc<dyn BackendConnector>, log_group: impl Into<String>) -> Self {
        let source = LogSourceClient::new(connector, log_group);
        Self {
            views,
            lookup: LookupService::new(source, RecordRenderer::default()),
        }
    }

    /// 按配置构建：加载模板，初始化 CloudWatch 基础身份
    pub async fn from_config(config: &LogLookupConfig) -> Result<Self> {
        let views = Views::load(&config.server.templates_dir)?;
        let connector = CloudWatchConnector::from_config(&config.backend).await?;
        Ok(Self::new(views, Arc::new(connector), config.backend.log_group.clone()))
    }
}
