//! 题目链控制器 - 编排层
//!
//! 驱动"抓取 → 计划 → 求解 → 提交 → 下一题"的循环，
//! 在每一步之前检查步数和时间预算，把单步结果映射为链状态。

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::GradingResult;
use crate::utils::logging::{log_chain_complete, log_chain_start};
use crate::workflow::{QuizFlow, QuizSession, StopReason};

/// 单条链的上限
#[derive(Debug, Clone, Copy)]
pub struct ChainLimits {
    pub max_steps: u32,
    pub time_budget: Duration,
}

impl ChainLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_steps: config.max_steps,
            time_budget: config.time_budget(),
        }
    }

    /// 开始新一步之前的检查：先步数，后时间
    ///
    /// 用时超过预算才停止，恰好用完预算时仍可开始下一步
    pub fn check(&self, session: &QuizSession) -> Option<StopReason> {
        if session.step >= self.max_steps {
            return Some(StopReason::StepLimitReached);
        }
        if session.elapsed() > self.time_budget {
            return Some(StopReason::TimeLimitReached);
        }
        None
    }
}

/// 链状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    Running(String),
    Stopped(StopReason),
}

impl ChainState {
    /// 评分结果 → 下一个状态
    ///
    /// 有下一题就继续，不论是否答对；没有下一题则链结束
    pub fn after_grading(grading: &GradingResult) -> Self {
        match grading.next_url() {
            Some(next) => ChainState::Running(next.to_string()),
            None => ChainState::Stopped(StopReason::Completed),
        }
    }
}

/// 链结束后的汇总
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub steps: u32,
    pub reason: StopReason,
    pub last_url: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl Display for ChainReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} 步, 原因 {}, 最后地址 {}, {} → {} ({:.1} 秒)",
            self.steps,
            self.reason,
            self.last_url,
            self.started_at.format("%H:%M:%S"),
            self.finished_at.format("%H:%M:%S"),
            self.elapsed.as_secs_f64()
        )
    }
}

pub struct ChainController {
    flow: QuizFlow,
    limits: ChainLimits,
}

impl ChainController {
    pub fn new(flow: QuizFlow, limits: ChainLimits) -> Self {
        Self { flow, limits }
    }

    /// 同步执行整条链直到结束，返回汇总
    ///
    /// 单步失败只记录日志并结束链，不向调用方抛出
    pub async fn run_chain(&self, mut session: QuizSession) -> ChainReport {
        log_chain_start(&session.current_url);

        let reason = loop {
            if let Some(reason) = self.limits.check(&session) {
                warn!(
                    "{} ⏱️ 达到上限 ({}), 已用 {:.1} 秒",
                    session,
                    reason,
                    session.elapsed().as_secs_f64()
                );
                break reason;
            }

            session.begin_step();
            let grading = match self.flow.run(&session).await {
                Ok(grading) => grading,
                Err(e) => {
                    error!("{} ❌ 步骤失败 ({}): {}", session, e.reason, e.source);
                    break e.reason;
                }
            };

            if grading.correct {
                info!("{} ✓ 回答正确", session);
            } else {
                warn!(
                    "{} ✗ 回答错误: {}",
                    session,
                    grading.reason.as_deref().unwrap_or("未给出原因")
                );
            }

            match ChainState::after_grading(&grading) {
                ChainState::Running(next) => {
                    if !grading.correct {
                        warn!("{} ⚠️ 答错但评分端给出了下一题，继续", session);
                    }
                    info!("{} ➡️ 下一题: {}", session, next);
                    session.advance(&next);
                }
                ChainState::Stopped(reason) => break reason,
            }
        };

        let report = ChainReport {
            steps: session.step,
            reason,
            last_url: session.current_url.clone(),
            started_at: session.started_wall,
            finished_at: Local::now(),
            elapsed: session.elapsed(),
        };
        log_chain_complete(report.steps, reason.as_str(), report.elapsed);
        report
    }
}
