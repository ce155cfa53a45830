//! # Quiz Chain Solver
//!
//! LLM 驱动的链式答题服务：抓取题目页面 → 模型给出计划 → 下载并解析数据
//! → 模型给出答案 → 按声明形态转换 → 提交 → 跟随下一题地址
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器进程、HTTP 连接池），只暴露能力
//!
//! ### ② 客户端与业务能力层（Clients / Services）
//! - `clients/` - LLM 与评分端点
//! - `services/` - 页面抓取、计划提取、数据获取与解析、答案求解、图表生成
//!
//! ### ③ 流程层（Workflow）
//! - `QuizSession` - 一条链的会话（凭据、起始时间、步数、当前地址）
//! - `QuizFlow` - 一道题的完整流程
//!
//! ### ④ 编排层（Orchestration）
//! - `ChainController` - 步数与时间预算下的循环
//! - `ChainDispatcher` - 有界队列 + 并发上限
//!
//! ### ⑤ 接口层（API）
//! - `api/server` - `POST /quiz`、`GET /health`

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppResult, ConfigError, QuizError};
pub use orchestrator::{ChainController, ChainLimits, ChainReport};
pub use workflow::{Credentials, QuizFlow, QuizSession, StopReason};
