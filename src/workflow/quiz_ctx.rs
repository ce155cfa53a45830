//! 题目链上下文
//!
//! 封装"谁在答题、从什么时候开始、现在在第几步"这一信息

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

/// 提交凭据
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub secret: String,
}

/// 一条题目链的会话状态
///
/// 每个请求创建一个，只由链控制器修改，链结束即丢弃
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub credentials: Credentials,

    /// 单调时钟起点，用于时间预算
    pub started_at: Instant,

    /// 墙上时间起点（仅用于日志）
    pub started_wall: DateTime<Local>,

    /// 已开始的步数，只增不减
    pub step: u32,

    pub current_url: String,
}

impl QuizSession {
    pub fn new(credentials: Credentials, url: impl Into<String>) -> Self {
        Self {
            credentials,
            started_at: Instant::now(),
            started_wall: Local::now(),
            step: 0,
            current_url: url.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// 进入下一步
    pub fn begin_step(&mut self) {
        self.step += 1;
    }

    /// 跳到评分端点给出的下一题
    pub fn advance(&mut self, next_url: &str) {
        self.current_url = next_url.to_string();
    }
}

impl Display for QuizSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[步骤 {}]", self.step)
    }
}
