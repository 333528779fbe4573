//! 日志查询流水线
//!
//! 参数 -> 过滤表达式 + 时间窗口 -> 分页拉取 -> 逐条渲染 -> 视图模型

pub mod assemble;
pub mod cloudwatch;
pub mod filter;
pub mod render;
pub mod source;
pub mod window;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{info, instrument, warn};

use crate::llcommon::{LookupQuery, Result, ViewModel};

pub use self::filter::{compile, FilterExpression};
pub use self::render::RecordRenderer;
pub use self::source::{BackendConnector, LogBackend, LogPage, LogSourceClient, SearchRequest};

/// 查询服务，启动时构建，之后只读
#[derive(Clone)]
pub struct LookupService {
    source: LogSourceClient,
    renderer: RecordRenderer,
}

impl LookupService {
    pub fn new(source: LogSourceClient, renderer: RecordRenderer) -> Self {
        Self { source, renderer }
    }

    /// 执行一次完整查询
    ///
    /// 分页中途失败时整个请求失败，已渲染的条目被丢弃
    #[instrument(target = "lookup", skip_all, fields(reqid = ?query.request_id, uuid = ?query.correlation_id))]
    pub async fn execute(&self, query: LookupQuery, now: DateTime<Utc>) -> Result<ViewModel> {
        let expression = filter::compile(&query)?;
        let window = window::resolve(&query, now)?;

        // since 只在解析时使用，之后以绝对时间为准
        let query = LookupQuery {
            since_hours: None,
            start_epoch: Some(window.start_seconds()),
            end_epoch: Some(window.end_seconds()),
            ..query
        };
        let env = query.environment_or_default();
        let stylesheet = self.renderer.stylesheet();

        let mut records = self.source.search(&expression, window, env).await?;
        let mut entries = Vec::new();
        while let Some(record) = records.next().await {
            match record {
                Ok(record) => entries.push(self.renderer.render(&record)),
                Err(e) => {
                    warn!(
                        target: "lookup",
                        discarded = entries.len(),
                        error.summary = e.get_error_type_summary(),
                        "分页失败，丢弃已渲染的结果"
                    );
                    return Err(e);
                }
            }
        }

        info!(target: "lookup", env = %env, entries = entries.len(), filter = %expression, "查询完成");
        Ok(assemble::assemble(query, window, entries, stylesheet))
    }
}
