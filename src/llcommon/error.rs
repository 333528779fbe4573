use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Missing time window: either `since` or both `start` and `end` are required")]
    MissingWindow,

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Web server error: {0}")]
    WebServerError(String),
}

impl AppError {
    /// 获取错误类型的简洁摘要，用于结构化日志中的错误分类
    ///
    /// 返回稳定的类别字符串，便于按类别聚合错误
    pub fn get_error_type_summary(&self) -> &'static str {
        match self {
            // 用户输入相关
            AppError::InvalidInput(_) => "lookup_input_invalid",
            AppError::InvalidDuration(_) => "lookup_duration_invalid",
            AppError::MissingWindow => "lookup_window_missing",

            // 日志后端相关
            AppError::AuthError(_) => "log_backend_auth_failed",
            AppError::BackendError(_) => "log_backend_request_failed",

            // 渲染相关
            AppError::RenderError(_) => "log_record_render_failed",
            AppError::JsonError(_) => "log_record_parsing_failed",

            // 系统与配置
            AppError::ConfigError(_) => "lookup_service_configuration_invalid",
            AppError::IoError(_) => "lookup_file_operation_failed",
            AppError::WebServerError(_) => "lookup_web_server_failed",
        }
    }

    /// 检查错误是否为可重试类型
    ///
    /// 认证失败属于配置问题而不是临时故障，不自动重试
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::BackendError(_) | AppError::IoError(_) => true,

            AppError::InvalidInput(_)
            | AppError::InvalidDuration(_)
            | AppError::MissingWindow
            | AppError::AuthError(_)
            | AppError::RenderError(_)
            | AppError::JsonError(_)
            | AppError::ConfigError(_)
            | AppError::WebServerError(_) => false,
        }
    }

    /// 对应的HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidDuration(_) | AppError::MissingWindow => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                target: "web",
                message = "请求处理失败",
                error.summary = self.get_error_type_summary(),
                error.details = %self
            );
        } else {
            tracing::info!(
                target: "web",
                message = "拒绝无效请求",
                error.summary = self.get_error_type_summary(),
                error.details = %self
            );
        }
        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
