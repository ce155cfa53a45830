//! 单步求解流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 抓取页面
//! 2. LLM 提取计划（不可用则停止）
//! 3. 逐个下载数据源（失败的跳过）
//! 4. LLM 求解并转换答案
//! 5. 提交并返回评分结果

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::{AnswerSubmitter, LanguageModel, OpenAiClient, SubmitClient};
use crate::config::Config;
use crate::error::{AppResult, QuizError};
use crate::models::{AcquiredDatum, GradingResult, Submission};
use crate::services::{
    AnswerResolver, ContentFetcher, DataAcquirer, DataSource, PageFetcher, PlanExtractor,
    PlottersChartRenderer,
};
use crate::utils::truncate_text;
use crate::workflow::quiz_ctx::QuizSession;

/// 题目链停止的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    Completed,
    StepLimitReached,
    TimeLimitReached,
    FetchFailed,
    PlanFailed,
    AnswerFailed,
    SubmitFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::StepLimitReached => "step-limit-reached",
            StopReason::TimeLimitReached => "time-limit-reached",
            StopReason::FetchFailed => "fetch-failed",
            StopReason::PlanFailed => "plan-failed",
            StopReason::AnswerFailed => "answer-failed",
            StopReason::SubmitFailed => "submit-failed",
        }
    }
}

impl Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单步失败：错误本身 + 对应的停止原因
#[derive(Debug, Error)]
#[error("{reason}: {source}")]
pub struct StepError {
    pub reason: StopReason,
    pub source: QuizError,
}

impl StepError {
    fn new(reason: StopReason, source: QuizError) -> Self {
        Self { reason, source }
    }
}

/// 单步求解流程
///
/// - 编排一道题的抓取、计划、下载、求解、提交
/// - 不持有跨步骤状态，会话由链控制器传入
/// - 只依赖业务能力（services / clients 的 trait）
pub struct QuizFlow {
    fetcher: Arc<dyn PageFetcher>,
    planner: PlanExtractor,
    acquirer: Arc<dyn DataSource>,
    resolver: AnswerResolver,
    submitter: Arc<dyn AnswerSubmitter>,
}

impl QuizFlow {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        planner: PlanExtractor,
        acquirer: Arc<dyn DataSource>,
        resolver: AnswerResolver,
        submitter: Arc<dyn AnswerSubmitter>,
    ) -> Self {
        Self {
            fetcher,
            planner,
            acquirer,
            resolver,
            submitter,
        }
    }

    /// 用真实的浏览器、OpenAI 兼容模型和 HTTP 客户端组装流程
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(config));

        Ok(Self::new(
            Arc::new(ContentFetcher::new(config)?),
            PlanExtractor::new(llm.clone(), config.page_content_limit),
            Arc::new(DataAcquirer::new(config)?),
            AnswerResolver::new(
                llm,
                Arc::new(PlottersChartRenderer::default()),
                config.data_preview_chars,
            ),
            Arc::new(SubmitClient::new(config.submit_timeout())?),
        ))
    }

    /// 执行当前会话的一步，返回评分结果
    pub async fn run(&self, session: &QuizSession) -> Result<GradingResult, StepError> {
        let url = session.current_url.as_str();

        // ========== 1. 抓取页面 ==========
        info!("{} 📄 抓取页面: {}", session, url);
        let content = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| StepError::new(StopReason::FetchFailed, e))?;
        info!(
            "{} ✓ 页面内容: {}",
            session,
            truncate_text(&content, 300)
        );

        // ========== 2. 提取计划 ==========
        let plan = self
            .planner
            .extract(&content, url)
            .await
            .map_err(|e| StepError::new(StopReason::PlanFailed, e))?;
        if !plan.is_usable() {
            let reason = plan
                .error
                .clone()
                .unwrap_or_else(|| "计划中没有提交地址".to_string());
            return Err(StepError::new(
                StopReason::PlanFailed,
                QuizError::PlanParse(reason),
            ));
        }
        info!("{} 📋 题目: {}", session, truncate_text(&plan.question, 200));

        // ========== 3. 下载数据 ==========
        let data = self.acquire_all(session, &plan.data_sources).await;

        // ========== 4. 求解 ==========
        let answer = self
            .resolver
            .resolve(&plan, &data)
            .await
            .map_err(|e| StepError::new(StopReason::AnswerFailed, e))?;

        // ========== 5. 提交 ==========
        info!(
            "{} 📤 提交答案 {} → {}",
            session,
            answer.preview(),
            plan.submit_url
        );
        let submission = Submission {
            email: session.credentials.email.clone(),
            secret: session.credentials.secret.clone(),
            url: url.to_string(),
            answer,
        };

        self.submitter
            .submit(&plan.submit_url, &submission)
            .await
            .map_err(|e| StepError::new(StopReason::SubmitFailed, e))
    }

    /// 按顺序下载，失败的数据源记录后跳过
    async fn acquire_all(&self, session: &QuizSession, sources: &[String]) -> Vec<AcquiredDatum> {
        let mut data = Vec::with_capacity(sources.len());
        for source in sources {
            match self.acquirer.acquire(source).await {
                Ok(datum) => {
                    info!("{} ✓ 数据源 {} ({:?})", session, source, datum.kind());
                    data.push(datum);
                }
                Err(e) => warn!("{} ⚠️ 数据源下载失败，跳过: {}", session, e),
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_wire_names() {
        assert_eq!(StopReason::StepLimitReached.to_string(), "step-limit-reached");
        assert_eq!(
            serde_json::to_value(StopReason::TimeLimitReached).unwrap(),
            serde_json::json!("time-limit-reached")
        );
    }

    #[test]
    fn test_step_error_message_carries_reason() {
        let err = StepError::new(
            StopReason::PlanFailed,
            QuizError::PlanParse("no json".into()),
        );
        assert!(err.to_string().starts_with("plan-failed"));
    }
}
