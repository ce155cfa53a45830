//! 对外接口层
//!
//! 接收解题请求并交给调度器

pub mod server;

pub use server::{create_router, serve, AppState, QuizRequest};
