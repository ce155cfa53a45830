//! 链控制器测试用的内存替身
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use quiz_chain_solver::clients::{AnswerSubmitter, LanguageModel};
use quiz_chain_solver::models::{AcquiredDatum, GradingResult, Submission};
use quiz_chain_solver::orchestrator::{ChainController, ChainLimits};
use quiz_chain_solver::services::{
    AnswerResolver, DataSource, PageFetcher, PlanExtractor, PlottersChartRenderer,
    PLAN_SYSTEM_PROMPT,
};
use quiz_chain_solver::workflow::{Credentials, QuizFlow, QuizSession};
use quiz_chain_solver::{AppResult, QuizError};

pub const START_URL: &str = "https://quiz.test/q1";

pub fn session(url: &str) -> QuizSession {
    QuizSession::new(
        Credentials {
            email: "student@example.com".into(),
            secret: "s3cret".into(),
        },
        url,
    )
}

pub fn limits(max_steps: u32, budget_secs: u64) -> ChainLimits {
    ChainLimits {
        max_steps,
        time_budget: Duration::from_secs(budget_secs),
    }
}

/// 页面抓取替身：可选延迟或失败
#[derive(Default)]
pub struct FakeFetcher {
    pub delay: Option<Duration>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(QuizError::fetch_failed(url, "connection refused"));
        }
        Ok(format!("<html><body>Quiz at {url}. POST the answer to /submit</body></html>"))
    }
}

/// 按系统提示区分计划请求与答案请求
pub struct ScriptedModel {
    pub plan_reply: String,
    pub answer_reply: String,
    pub plan_calls: AtomicUsize,
    pub answer_prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(plan_reply: impl Into<String>, answer_reply: impl Into<String>) -> Self {
        Self {
            plan_reply: plan_reply.into(),
            answer_reply: answer_reply.into(),
            plan_calls: AtomicUsize::new(0),
            answer_prompts: Mutex::new(Vec::new()),
        }
    }

    /// 数字题，提交到相对地址 `/submit`
    pub fn number_quiz() -> Self {
        Self::new(plan_json(&[], "/submit", "number"), "The answer is 42.")
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub fn answer_calls(&self) -> usize {
        self.answer_prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn send_to_llm(&self, user_message: &str, system_message: Option<&str>) -> AppResult<String> {
        if system_message == Some(PLAN_SYSTEM_PROMPT) {
            self.plan_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.plan_reply.clone())
        } else {
            self.answer_prompts
                .lock()
                .unwrap()
                .push(user_message.to_string());
            Ok(self.answer_reply.clone())
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn plan_json(sources: &[&str], submit_url: &str, format: &str) -> String {
    json!({
        "question": "What is the sum of the value column?",
        "data_sources": sources,
        "analysis_needed": "sum the values",
        "submit_url": submit_url,
        "answer_format": format,
    })
    .to_string()
}

/// 数据源替身：地址含 "broken" 的失败，其余返回纯文本
#[derive(Default)]
pub struct FakeSource {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DataSource for FakeSource {
    async fn acquire(&self, url: &str) -> AppResult<AcquiredDatum> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(QuizError::acquisition_failed(url, "状态码 404"));
        }
        Ok(AcquiredDatum::RawText {
            text: format!("contents of {url}"),
        })
    }
}

type GradeFn = dyn Fn(usize, &Submission) -> AppResult<GradingResult> + Send + Sync;

/// 评分端替身：第 n 次提交（从 1 开始）交给闭包决定结果
pub struct FakeGrader {
    grade: Box<GradeFn>,
    pub submissions: Mutex<Vec<(String, Submission)>>,
}

impl FakeGrader {
    pub fn new(
        grade: impl Fn(usize, &Submission) -> AppResult<GradingResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            grade: Box::new(grade),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// 永远答对并给出下一题
    pub fn endless() -> Self {
        Self::new(|n, _| Ok(graded(true, Some(&format!("https://quiz.test/q{}", n + 1)))))
    }

    pub fn calls(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl AnswerSubmitter for FakeGrader {
    async fn submit(&self, submit_url: &str, submission: &Submission) -> AppResult<GradingResult> {
        let n = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push((submit_url.to_string(), submission.clone()));
            submissions.len()
        };
        (self.grade)(n, submission)
    }
}

pub fn graded(correct: bool, next_url: Option<&str>) -> GradingResult {
    GradingResult {
        correct,
        next_url: next_url.map(str::to_string),
        reason: None,
    }
}

pub struct Harness {
    pub fetcher: Arc<FakeFetcher>,
    pub model: Arc<ScriptedModel>,
    pub source: Arc<FakeSource>,
    pub grader: Arc<FakeGrader>,
}

impl Harness {
    pub fn new(fetcher: FakeFetcher, model: ScriptedModel, grader: FakeGrader) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            model: Arc::new(model),
            source: Arc::new(FakeSource::default()),
            grader: Arc::new(grader),
        }
    }

    pub fn controller(&self, limits: ChainLimits) -> ChainController {
        let llm: Arc<dyn LanguageModel> = self.model.clone();
        let flow = QuizFlow::new(
            self.fetcher.clone(),
            PlanExtractor::new(llm.clone(), 8000),
            self.source.clone(),
            AnswerResolver::new(llm, Arc::new(PlottersChartRenderer::default()), 12000),
            self.grader.clone(),
        );
        ChainController::new(flow, limits)
    }
}
