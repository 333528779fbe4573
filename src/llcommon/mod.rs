// 导出共享模块
pub mod config;
pub mod error;
pub mod logging_setup;
pub mod models;

// 重新导出常用类型，方便使用
pub use config::{BackendConfig, LogFormat, LogLookupConfig, LoggingConfig, ServerConfig};
pub use error::{AppError, Result};
pub use models::{
    Environment, LookupParams, LookupQuery, RawLogRecord, RenderedLogEntry, TimeWindow, ViewModel,
};
