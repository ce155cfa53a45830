//! 计划提取服务 - 业务能力层
//!
//! 页面内容 → LLM → `Plan`，并修复提交地址

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::clients::LanguageModel;
use crate::error::{AppResult, QuizError};
use crate::models::Plan;
use crate::utils::{char_prefix, extract_structured, truncate_text};

pub const PLAN_SYSTEM_PROMPT: &str = r#"You are an expert data analyst and quiz solver. You receive HTML content from quiz pages and must:
1. Extract the quiz question/task from the HTML
2. Identify any data sources (URLs to download files, APIs to call, etc.)
3. Determine what data processing/analysis is needed
4. Extract the submit URL for the answer - construct the full URL from the quiz URL context
5. Return a structured plan to solve the quiz

Focus on finding:
- The question being asked
- Any file downloads (PDFs, CSVs, spreadsheets, JSON)
- Data analysis requirements (sum, filter, aggregate, etc.)
- The submit URL - if you see "/submit" or a relative path, construct the full URL using the quiz URL's domain
- The expected answer format (number, string, boolean, json, base64_image)

For submit URLs:
- If the page says "POST to /submit", construct the full URL from the quiz URL
- If the quiz is at "https://example.com/demo", the submit URL is "https://example.com/submit"
- Never use placeholders like "current-page-url", always construct the real URL

Return only JSON with this structure:
{
  "question": "the question text",
  "data_sources": ["url1", "url2"],
  "analysis_needed": "description of what to do",
  "submit_url": "https://example.com/submit",
  "answer_format": "number|string|boolean|json|base64_image"
}"#;

/// 最长的先匹配，避免 `<current-page-url>` 只替换掉中间部分
const PLACEHOLDER_TOKENS: [&str; 3] = ["<current-page-url>", "{current-page-url}", "current-page-url"];

pub struct PlanExtractor {
    llm: Arc<dyn LanguageModel>,
    page_content_limit: usize,
}

impl PlanExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>, page_content_limit: usize) -> Self {
        Self {
            llm,
            page_content_limit,
        }
    }

    /// 从页面内容中提取计划
    ///
    /// 模型回复为空时返回 `EmptyModelResponse`；回复无法解析时返回错误计划
    pub async fn extract(&self, content: &str, quiz_url: &str) -> AppResult<Plan> {
        let user_message = format!(
            "The quiz is at URL: {}\n\nExtract the quiz task from this HTML and provide a solution plan. \
             Construct the submit URL using this quiz URL's domain:\n\n{}",
            quiz_url,
            char_prefix(content, self.page_content_limit)
        );

        let reply = self
            .llm
            .send_to_llm(&user_message, Some(PLAN_SYSTEM_PROMPT))
            .await?;
        if reply.trim().is_empty() {
            return Err(QuizError::EmptyModelResponse {
                model: self.llm.model_name().to_string(),
            });
        }
        info!("📋 模型计划: {}", truncate_text(reply.trim(), 500));

        let mut plan = parse_plan(&reply);
        if plan.is_error() {
            warn!("⚠️ 计划解析失败: {}", plan.error.as_deref().unwrap_or_default());
            return Ok(plan);
        }

        plan.submit_url = repair_submit_url(&plan.submit_url, quiz_url);
        Ok(plan)
    }
}

/// 模型回复 → 计划；任何解析问题都得到错误计划
pub fn parse_plan(reply: &str) -> Plan {
    let value = match extract_structured(reply) {
        Ok(value) => value,
        Err(e) => return Plan::error(e.to_string()),
    };
    if !value.is_object() {
        return Plan::error("计划必须是 JSON 对象");
    }

    serde_json::from_value::<Plan>(value)
        .unwrap_or_else(|e| Plan::error(format!("计划字段不合法: {e}")))
}

/// 把模型给出的提交地址修正为绝对地址
///
/// 只有含占位符或不以 `http` 开头时才处理；空地址原样返回
pub fn repair_submit_url(submit_url: &str, quiz_url: &str) -> String {
    let submit = submit_url.trim();
    if submit.is_empty() {
        return String::new();
    }

    let placeholder = PLACEHOLDER_TOKENS
        .iter()
        .copied()
        .find(|token| submit.contains(token));
    if placeholder.is_none() && submit.starts_with("http") {
        return submit.to_string();
    }

    let base = match Url::parse(quiz_url) {
        Ok(base) => base,
        Err(e) => {
            warn!("⚠️ 题目地址无法解析 ({}), 提交地址保持原样: {}", e, submit);
            return submit.to_string();
        }
    };
    let authority = match (base.host_str(), base.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let repaired = if submit.starts_with('/') {
        format!("{}://{}{}", base.scheme(), authority, submit)
    } else if let Some(token) = placeholder {
        let replaced = submit.replace(token, &authority);
        if replaced.starts_with("http") {
            replaced
        } else {
            format!("{}://{}", base.scheme(), replaced)
        }
    } else {
        match base.join(submit) {
            Ok(joined) => joined.to_string(),
            Err(e) => {
                warn!("⚠️ 提交地址无法拼接 ({}): {}", e, submit);
                submit.to_string()
            }
        }
    };

    info!("🔧 提交地址修正: {} → {}", submit, repaired);
    repaired
}
