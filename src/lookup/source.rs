//! 日志源客户端
//!
//! 把后端的分页接口包装成惰性、只进、不可重启的记录流。
//! 下一页只在上一页被消费完之后才会请求；任何一页失败都会结束整个流

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::llcommon::{AppError, Environment, RawLogRecord, Result, TimeWindow};
use crate::lookup::filter::FilterExpression;

/// 一次后端查询请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub filter_pattern: String,
    pub log_group_name: String,
    pub start_time: i64,
    pub end_time: i64,
}

/// 后端返回的一页数据
#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub records: Vec<RawLogRecord>,
    /// 下一页的续传令牌，None 表示已到末尾
    pub next_token: Option<String>,
}

/// 日志后端：按续传令牌拉取单页
#[async_trait]
pub trait LogBackend: Send + Sync {
    async fn fetch_page(&self, request: &SearchRequest, next_token: Option<String>) -> Result<LogPage>;
}

/// 凭证/角色协作者：为指定环境建立后端连接
///
/// 无法获得凭证时返回 [`AppError::AuthError`]
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self, env: Environment) -> Result<Arc<dyn LogBackend>>;
}

/// 记录流
pub type RecordStream = BoxStream<'static, Result<RawLogRecord>>;

enum Cursor {
    First,
    Next(String),
}

/// 日志源客户端
#[derive(Clone)]
pub struct LogSourceClient {
    connector: Arc<dyn BackendConnector>,
    log_group: String,
}

impl LogSourceClient {
    pub fn new(connector: Arc<dyn BackendConnector>, log_group: impl Into<String>) -> Self {
        Self { connector, log_group: log_group.into() }
    }

    pub fn log_group(&self) -> &str {
        &self.log_group
    }

    /// 建立连接并返回记录流
    ///
    /// 连接阶段的错误直接返回；之后的分页错误作为流中的最后一项出现
    pub async fn search(
        &self,
        expression: &FilterExpression,
        window: TimeWindow,
        env: Environment,
    ) -> Result<RecordStream> {
        let backend = self.connector.connect(env).await?;
        let request = SearchRequest {
            filter_pattern: expression.as_str().to_string(),
            log_group_name: self.log_group.clone(),
            start_time: window.start_epoch_millis,
            end_time: window.end_epoch_millis,
        };
        info!(
            target: "source",
            env = %env,
            log_group = %request.log_group_name,
            filter = %request.filter_pattern,
            start_time = request.start_time,
            end_time = request.end_time,
            "开始查询日志"
        );
        Ok(paginate(backend, request))
    }
}

/// 逐页拉取并展平为记录流
pub fn paginate(backend: Arc<dyn LogBackend>, request: SearchRequest) -> RecordStream {
    let pages = stream::try_unfold(Some(Cursor::First), move |cursor| {
        let backend = backend.clone();
        let request = request.clone();
        async move {
            let token = match cursor {
                None => return Ok::<_, AppError>(None),
                Some(Cursor::First) => None,
                Some(Cursor::Next(token)) => Some(token),
            };

            let page = backend.fetch_page(&request, token.clone()).await.map_err(|e| match e {
                AppError::BackendError(_) | AppError::AuthError(_) => e,
                other => AppError::BackendError(other.to_string()),
            })?;
            debug!(target: "source", records = page.records.len(), has_more = page.next_token.is_some(), "收到一页日志");

            let next = match page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    warn!(target: "source", "后端重复返回相同的续传令牌，停止分页");
                    None
                }
                Some(next) => Some(Cursor::Next(next)),
                None => None,
            };
            Ok::<_, AppError>(Some((page.records, next)))
        }
    });

    pages
        .map_ok(|records| stream::iter(records.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}
