use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use tracing::info;

use crate::llcommon::{AppError, LookupParams, LookupQuery, Result};
use crate::llserver::AppContext;
use crate::lookup::{filter, window};

/// 查询表单
pub async fn index_handler(State(ctx): State<Arc<AppContext>>) -> Html<String> {
    Html(ctx.views.render_index())
}

/// 把 since 换算成绝对时间后重定向到 `/q`
pub async fn canonical_handler(Query(params): Query<LookupParams>) -> Result<Response> {
    let query = LookupQuery::from_params(&params)?;
    let hours = query
        .since_hours
        .ok_or_else(|| AppError::InvalidDuration("缺少 since 参数".to_string()))?;
    let range = window::resolve_since(hours, Utc::now())?;
    info!(target: "web", from = range.start, "最近 {} 小时", hours);

    let location = canonical_location(&query, range.start, range.end);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// 执行查询流程并渲染结果页
pub async fn lookup_handler(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<LookupParams>,
) -> Result<Html<String>> {
    let query = LookupQuery::from_params(&params)?;
    info!(target: "web", args = ?query, "解析查询参数");

    let view = ctx.lookup.execute(query, Utc::now()).await?;
    Ok(Html(ctx.views.render_log_output(&view)))
}

/// `/q` 的规范地址，只带上生效的那个标识符
pub fn canonical_location(query: &LookupQuery, start: i64, end: i64) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("start", &start.to_string());
    serializer.append_pair("end", &end.to_string());
    if let Some(env) = query.environment {
        serializer.append_pair("env", env.as_str());
    }
    if let Some((field, value)) = filter::selected_identifier(query) {
        let name = if field == filter::REQUEST_ID_FIELD { "reqid" } else { "uuid" };
        serializer.append_pair(name, value);
    }
    format!("/q?{}", serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llcommon::Environment;

    #[test]
    fn test_canonical_location_prefers_request_id() {
        let query = LookupQuery {
            request_id: Some("req 1".to_string()),
            correlation_id: Some("corr".to_string()),
            environment: Some(Environment::Prod),
            ..Default::default()
        };
        assert_eq!(canonical_location(&query, 10, 20), "/q?start=10&end=20&env=prod&reqid=req+1");
    }

    #[test]
    fn test_canonical_location_without_identifiers() {
        assert_eq!(canonical_location(&LookupQuery::default(), 10, 20), "/q?start=10&end=20");
    }
}
