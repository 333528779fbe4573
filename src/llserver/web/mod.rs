pub mod handlers;
pub mod server;
pub mod views;

pub use self::server::{create_app, serve, start_web_server};
pub use self::views::Views;
