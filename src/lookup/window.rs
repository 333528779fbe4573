//! 时间窗口解析
//!
//! 相对时长（最近 N 小时）或显式起止时间 -> 绝对时间窗口。
//! 内部以秒计算，输出转换为后端使用的毫秒

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::llcommon::{AppError, LookupQuery, Result, TimeWindow};

const SECONDS_PER_HOUR: i64 = 3600;

/// 以秒为单位的窗口，用于 `/l` 重定向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochRange {
    pub start: i64,
    pub end: i64,
}

impl EpochRange {
    pub fn to_millis(self) -> Result<TimeWindow> {
        let to_ms = |secs: i64| {
            secs.checked_mul(1000)
                .ok_or_else(|| AppError::InvalidInput(format!("时间戳超出范围: {}", secs)))
        };
        Ok(TimeWindow {
            start_epoch_millis: to_ms(self.start)?,
            end_epoch_millis: to_ms(self.end)?,
        })
    }
}

/// 把 since_hours 换算成 [now - h, now]
pub fn resolve_since(hours: i64, now: DateTime<Utc>) -> Result<EpochRange> {
    if hours <= 0 {
        return Err(AppError::InvalidDuration(format!("since 必须是正整数小时数，实际为 {}", hours)));
    }
    let end = now.timestamp();
    let start = hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|span| end.checked_sub(span))
        .filter(|start| *start >= 0)
        .ok_or_else(|| AppError::InvalidDuration(format!("since 超出范围: {}", hours)))?;
    debug!(target: "window", hours, start, end, "最近 {} 小时", hours);
    Ok(EpochRange { start, end })
}

/// 解析秒级窗口：since 优先，其次显式 start/end
pub fn resolve_seconds(query: &LookupQuery, now: DateTime<Utc>) -> Result<EpochRange> {
    if let Some(hours) = query.since_hours {
        return resolve_since(hours, now);
    }

    match (query.start_epoch, query.end_epoch) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(AppError::InvalidInput(format!(
                    "开始时间晚于结束时间: start={} end={}",
                    start, end
                )));
            }
            Ok(EpochRange { start, end })
        }
        _ => Err(AppError::MissingWindow),
    }
}

/// 解析为后端使用的毫秒窗口
pub fn resolve(query: &LookupQuery, now: DateTime<Utc>) -> Result<TimeWindow> {
    resolve_seconds(query, now)?.to_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_since_hours() {
        for hours in [1_i64, 2, 24, 24 * 90] {
            let query = LookupQuery { since_hours: Some(hours), ..Default::default() };
            let window = resolve(&query, now()).unwrap();
            assert_eq!(window.end_epoch_millis, 1_700_000_000 * 1000);
            assert_eq!(window.start_epoch_millis, (1_700_000_000 - hours * 3600) * 1000);
            assert_eq!(window.end_seconds(), 1_700_000_000);
        }
    }

    #[test]
    fn test_since_must_be_positive() {
        for hours in [0_i64, -1, -48] {
            let query = LookupQuery { since_hours: Some(hours), ..Default::default() };
            assert!(matches!(resolve(&query, now()), Err(AppError::InvalidDuration(_))));
        }
    }

    #[test]
    fn test_since_overflow() {
        let query = LookupQuery { since_hours: Some(i64::MAX), ..Default::default() };
        assert!(matches!(resolve(&query, now()), Err(AppError::InvalidDuration(_))));
    }

    #[test]
    fn test_since_before_epoch_rejected() {
        let query = LookupQuery { since_hours: Some(600_000), ..Default::default() };
        assert!(matches!(resolve(&query, now()), Err(AppError::InvalidDuration(_))));

        let hours = 1_700_000_000 / 3600;
        let range = resolve_since(hours, now()).unwrap();
        assert!(range.start >= 0);
    }

    #[test]
    fn test_explicit_window() {
        let query = LookupQuery { start_epoch: Some(1000), end_epoch: Some(2000), ..Default::default() };
        let window = resolve(&query, now()).unwrap();
        assert_eq!(window.start_epoch_millis, 1_000_000);
        assert_eq!(window.end_epoch_millis, 2_000_000);
    }

    #[test]
    fn test_since_takes_priority_over_explicit() {
        let query = LookupQuery {
            since_hours: Some(1),
            start_epoch: Some(1000),
            end_epoch: Some(2000),
            ..Default::default()
        };
        let window = resolve(&query, now()).unwrap();
        assert_eq!(window.end_seconds(), 1_700_000_000);
    }

    #[test]
    fn test_missing_window() {
        let query = LookupQuery { start_epoch: Some(1000), ..Default::default() };
        assert!(matches!(resolve(&query, now()), Err(AppError::MissingWindow)));
        assert!(matches!(resolve(&LookupQuery::default(), now()), Err(AppError::MissingWindow)));
    }

    #[test]
    fn test_start_after_end() {
        let query = LookupQuery { start_epoch: Some(3000), end_epoch: Some(2000), ..Default::default() };
        assert!(matches!(resolve(&query, now()), Err(AppError::InvalidInput(_))));
    }
}
