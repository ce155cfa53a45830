use serde::{Deserialize, Serialize};

use crate::models::Answer;

/// 提交给评分端点的请求体
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub email: String,
    pub secret: String,
    /// 当前题目页面地址
    pub url: String,
    pub answer: Answer,
}

/// 评分端点的返回
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    #[serde(default)]
    pub correct: bool,

    /// 下一题地址
    #[serde(default, rename = "url", skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GradingResult {
    /// 非空的下一题地址
    pub fn next_url(&self) -> Option<&str> {
        self.next_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
