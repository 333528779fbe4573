// Web服务器实现
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::llcommon::{AppError, Result};
use crate::llserver::AppContext;

use super::handlers;

/// 创建路由
pub fn create_app(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/l", get(handlers::canonical_handler))
        .route("/q", get(handlers::lookup_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// 在已绑定的监听器上提供服务
pub async fn serve(listener: TcpListener, ctx: Arc<AppContext>) -> Result<()> {
    let app = create_app(ctx);

    match axum::serve(listener, app).await {
        Ok(_) => info!(target: "web", "Web服务器已关闭"),
        Err(e) => {
            error!(target: "web", "Web服务器错误: {}", e);
            return Err(AppError::WebServerError(format!("Web服务器错误: {}", e)));
        }
    }

    Ok(())
}

/// 启动Web服务器
pub async fn start_web_server(addr: SocketAddr, ctx: Arc<AppContext>) -> Result<()> {
    info!(target: "web", "Web服务器开始绑定到地址: {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::WebServerError(format!("绑定地址失败: {}", e)))?;

    info!(target: "web", "Web服务器启动在 http://{}", addr);
    serve(listener, ctx).await
}
