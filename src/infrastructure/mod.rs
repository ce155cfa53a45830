//! 基础设施层
//!
//! 持有稀缺资源（浏览器进程、HTTP 连接池），只暴露能力，不认识题目

pub mod browser;
pub mod http;

pub use browser::{render_page, RenderOptions};
pub use http::build_http_client;
