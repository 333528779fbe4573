// 导出模块
pub mod llcommon;
pub mod llserver;
pub mod lookup;

// Re-export error types
pub use llcommon::error::AppError;
