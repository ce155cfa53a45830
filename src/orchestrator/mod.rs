//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `chain_controller` - 题目链控制器
//! - 逐步调用 `workflow::QuizFlow`
//! - 每步之前检查步数和时间预算
//! - 根据评分结果决定继续或停止，输出 `ChainReport`
//!
//! ### `dispatcher` - 调度器
//! - 有界队列接收请求，队列满时拒绝
//! - Semaphore 限制同时运行的链数
//! - 每条链独立 tokio 任务，结果只写日志
//!
//! ## 层次关系
//!
//! ```text
//! api::server (接收请求)
//!     ↓
//! dispatcher (排队 + 并发控制)
//!     ↓
//! chain_controller (处理一条链)
//!     ↓
//! workflow::QuizFlow (处理一道题)
//!     ↓
//! services / clients (能力层：抓取 / 计划 / 下载 / 求解 / 提交)
//!     ↓
//! infrastructure (基础设施：浏览器、HTTP)
//! ```

pub mod chain_controller;
pub mod dispatcher;

pub use chain_controller::{ChainController, ChainLimits, ChainReport, ChainState};
pub use dispatcher::{ChainDispatcher, ChainTask};
