//! 过滤表达式编译
//!
//! 把查询参数翻译成 CloudWatch Logs 的 JSON 过滤表达式。
//! 优先级：request id > correlation id > 默认的 error 级别过滤

use std::fmt;

use tracing::debug;

use crate::llcommon::{AppError, LookupQuery, Result};

/// 没有任何标识符时使用的默认表达式
pub const DEFAULT_FILTER: &str = r#"{ $.level = "error" }"#;

/// request id 在日志中的字段
pub const REQUEST_ID_FIELD: &str = "$.fields.requestID";

/// correlation id 在日志中的字段
pub const CORRELATION_ID_FIELD: &str = "$.fields.evt.mefeAPIRequestId";

/// 编译后的过滤表达式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression(String);

impl FilterExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 编译查询为过滤表达式，纯函数
pub fn compile(query: &LookupQuery) -> Result<FilterExpression> {
    let expression = match selected_identifier(query) {
        Some((field, value)) => {
            check_literal(value)?;
            format!(r#"{{ {} = "{}" }}"#, field, value)
        }
        None => DEFAULT_FILTER.to_string(),
    };
    debug!(target: "filter", filter = %expression, "过滤表达式编译完成");
    Ok(FilterExpression(expression))
}

/// 按优先级选出唯一生效的标识符及其字段
pub(crate) fn selected_identifier(query: &LookupQuery) -> Option<(&'static str, &str)> {
    if let Some(request_id) = trimmed(&query.request_id) {
        return Some((REQUEST_ID_FIELD, request_id));
    }
    trimmed(&query.correlation_id).map(|id| (CORRELATION_ID_FIELD, id))
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// 拒绝能跳出字符串字面量的字符
fn check_literal(value: &str) -> Result<()> {
    if let Some(c) = value.chars().find(|c| matches!(c, '"' | '\\') || c.is_control()) {
        return Err(AppError::InvalidInput(format!(
            "标识符中包含不允许的字符 {:?}: {:?}",
            c, value
        )));
    }
    Ok(())
}
