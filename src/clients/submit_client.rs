//! 评分端点客户端
//!
//! 封装答案提交与评分结果解析

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

use crate::error::{AppResult, QuizError};
use crate::infrastructure::http::build_http_client;
use crate::models::{GradingResult, Submission};
use crate::utils::truncate_text;

/// 提交答案的能力
#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    /// 提交答案并返回评分结果；非 200 或网络错误视为提交失败，不重试
    async fn submit(&self, submit_url: &str, submission: &Submission) -> AppResult<GradingResult>;
}

/// 基于 reqwest 的提交客户端
pub struct SubmitClient {
    http: Client,
}

impl SubmitClient {
    /// 创建新的提交客户端
    pub fn new(timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl AnswerSubmitter for SubmitClient {
    async fn submit(&self, submit_url: &str, submission: &Submission) -> AppResult<GradingResult> {
        debug!("提交 Payload 答案: {}", submission.answer.preview());

        let response = self
            .http
            .post(submit_url)
            .json(submission)
            .send()
            .await
            .map_err(|e| {
                error!("提交答案请求失败: {}", e);
                QuizError::submission_failed(submit_url, None, e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            QuizError::submission_failed(submit_url, Some(status.as_u16()), e)
        })?;

        info!("📬 提交响应状态: {}", status);
        info!("📬 提交响应内容: {}", truncate_text(&body, 500));

        if status != StatusCode::OK {
            error!("提交失败，状态码 {}", status);
            return Err(QuizError::submission_failed(
                submit_url,
                Some(status.as_u16()),
                truncate_text(&body, 200),
            ));
        }

        serde_json::from_str::<GradingResult>(&body).map_err(|e| {
            QuizError::submission_failed(submit_url, Some(status.as_u16()), format!("响应不是合法的评分结果: {e}"))
        })
    }
}
