//! 测试错误分类系统
//!
//! 验证 AppError 的类别摘要、可重试判断和HTTP状态码

use axum::http::StatusCode;
use log_lookup::llcommon::error::AppError;

#[test]
fn test_input_error_classification() {
    let error = AppError::InvalidInput("start 必须是秒级时间戳".to_string());
    assert_eq!(error.get_error_type_summary(), "lookup_input_invalid");
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert!(!error.is_retryable());
}

#[test]
fn test_duration_error_classification() {
    let error = AppError::InvalidDuration("0".to_string());
    assert_eq!(error.get_error_type_summary(), "lookup_duration_invalid");
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

    let missing = AppError::MissingWindow;
    assert_eq!(missing.get_error_type_summary(), "lookup_window_missing");
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_auth_error_classification() {
    let error = AppError::AuthError("AccessDenied".to_string());
    assert_eq!(error.get_error_type_summary(), "log_backend_auth_failed");
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!error.is_retryable()); // 认证问题属于配置故障
}

#[test]
fn test_backend_error_classification() {
    let error = AppError::BackendError("ThrottlingException".to_string());
    assert_eq!(error.get_error_type_summary(), "log_backend_request_failed");
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error.is_retryable());
}

#[test]
fn test_json_error_classification() {
    let json_error = serde_json::from_str::<serde_json::Value>("{invalid_json").unwrap_err();
    let error = AppError::from(json_error);
    assert_eq!(error.get_error_type_summary(), "log_record_parsing_failed");
    assert!(!error.is_retryable());
}

#[test]
fn test_error_summaries_are_stable_identifiers() {
    let errors = vec![
        AppError::InvalidInput("x".to_string()),
        AppError::InvalidDuration("x".to_string()),
        AppError::MissingWindow,
        AppError::AuthError("x".to_string()),
        AppError::BackendError("x".to_string()),
        AppError::RenderError("x".to_string()),
        AppError::ConfigError("x".to_string()),
        AppError::WebServerError("x".to_string()),
    ];

    for error in errors {
        let summary = error.get_error_type_summary();
        assert!(!summary.is_empty());
        assert!(summary.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{}", summary);
    }
}
