//! 日志查询的数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::llcommon::{AppError, Result};

/// 日志所属的部署环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Demo,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Demo, Environment::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Demo => "demo",
            Environment::Prod => "prod",
        }
    }

    /// 解析环境名称，空值视为 dev，未知名称直接拒绝
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "" | "dev" => Ok(Environment::Dev),
            "demo" => Ok(Environment::Demo),
            "prod" => Ok(Environment::Prod),
            other => Err(AppError::InvalidInput(format!("未知的环境: {:?}", other))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP 层传入的原始查询参数
///
/// 所有字段都保持字符串形式，数值校验在 [`LookupQuery::from_params`] 中完成，
/// 这样非法数字会得到统一的 400 响应而不是框架默认的拒绝信息
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    pub uuid: Option<String>,
    pub reqid: Option<String>,
    pub env: Option<String>,
    pub since: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// 一次日志查询
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupQuery {
    pub correlation_id: Option<String>,
    pub request_id: Option<String>,
    pub environment: Option<Environment>,
    pub since_hours: Option<i64>,
    pub start_epoch: Option<i64>,
    pub end_epoch: Option<i64>,
}

impl LookupQuery {
    /// 从原始参数构建查询，去除首尾空白并校验数值字段
    pub fn from_params(params: &LookupParams) -> Result<Self> {
        let environment = match non_empty(params.env.as_deref()) {
            Some(env) => Some(Environment::parse(&env)?),
            None => None,
        };

        let since_hours = match params.since.as_deref() {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|e| {
                AppError::InvalidDuration(format!("since 必须是整数小时数: {:?} ({})", raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            correlation_id: non_empty(params.uuid.as_deref()),
            request_id: non_empty(params.reqid.as_deref()),
            environment,
            since_hours,
            start_epoch: parse_epoch("start", params.start.as_deref())?,
            end_epoch: parse_epoch("end", params.end.as_deref())?,
        })
    }

    /// 实际使用的环境，未指定时为 dev
    pub fn environment_or_default(&self) -> Environment {
        self.environment.unwrap_or_default()
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_epoch(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value = raw
        .parse::<i64>()
        .map_err(|e| AppError::InvalidInput(format!("{} 必须是秒级时间戳: {:?} ({})", name, raw, e)))?;
    if value < 0 {
        return Err(AppError::InvalidInput(format!("{} 不能为负数: {}", name, value)));
    }
    Ok(Some(value))
}

/// 已解析的绝对时间窗口（毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start_epoch_millis: i64,
    pub end_epoch_millis: i64,
}

impl TimeWindow {
    pub fn start_seconds(&self) -> i64 {
        self.start_epoch_millis / 1000
    }

    pub fn end_seconds(&self) -> i64 {
        self.end_epoch_millis / 1000
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.start_epoch_millis)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.end_epoch_millis)
    }
}

/// 后端返回的原始日志记录，不做任何修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogRecord {
    pub message: String,
}

impl RawLogRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// 渲染后的日志条目
///
/// `markup` 只能由渲染器构造，其中所有日志原文均已做 HTML 转义，
/// 可以直接嵌入页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLogEntry {
    markup: String,
}

impl RenderedLogEntry {
    pub(crate) fn from_trusted_markup(markup: String) -> Self {
        Self { markup }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// 交给展示层的视图模型
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub entries: Vec<RenderedLogEntry>,
    pub stylesheet: String,
    pub query: LookupQuery,
    pub window: TimeWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("").unwrap(), Environment::Dev);
        assert_eq!(Environment::parse(" demo ").unwrap(), Environment::Demo);
        assert_eq!(Environment::parse("prod").unwrap(), Environment::Prod);
        assert!(matches!(Environment::parse("prod\""), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_from_params_trims_and_parses() {
        let params = LookupParams {
            uuid: Some("  ".to_string()),
            reqid: Some(" abc123 ".to_string()),
            env: Some("demo".to_string()),
            start: Some("1000".to_string()),
            end: Some("2000".to_string()),
            ..Default::default()
        };
        let query = LookupQuery::from_params(&params).unwrap();
        assert_eq!(query.correlation_id, None);
        assert_eq!(query.request_id.as_deref(), Some("abc123"));
        assert_eq!(query.environment, Some(Environment::Demo));
        assert_eq!(query.start_epoch, Some(1000));
        assert_eq!(query.end_epoch, Some(2000));
    }

    #[test]
    fn test_from_params_rejects_bad_numbers() {
        let params = LookupParams { since: Some("abc".to_string()), ..Default::default() };
        assert!(matches!(LookupQuery::from_params(&params), Err(AppError::InvalidDuration(_))));

        let params = LookupParams { start: Some("1e3".to_string()), ..Default::default() };
        assert!(matches!(LookupQuery::from_params(&params), Err(AppError::InvalidInput(_))));

        let params = LookupParams { end: Some("-5".to_string()), ..Default::default() };
        assert!(matches!(LookupQuery::from_params(&params), Err(AppError::InvalidInput(_))));
    }
}
