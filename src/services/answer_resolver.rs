//! 答案求解服务 - 业务能力层
//!
//! 计划 + 数据 → LLM → 按声明形态转换的答案

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};

use crate::clients::LanguageModel;
use crate::error::{AppResult, QuizError};
use crate::models::{AcquiredDatum, Answer, AnswerShape, Plan};
use crate::services::chart_renderer::{ChartData, ChartKind, ChartRenderer};
use crate::utils::json_extract::braced_slice;
use crate::utils::{char_prefix, truncate_text};

pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are a precise data analyst. Provide exact, concise answers.";

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("数字正则不合法"));

pub struct AnswerResolver {
    llm: Arc<dyn LanguageModel>,
    charts: Arc<dyn ChartRenderer>,
    data_preview_chars: usize,
}

impl AnswerResolver {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        charts: Arc<dyn ChartRenderer>,
        data_preview_chars: usize,
    ) -> Self {
        Self {
            llm,
            charts,
            data_preview_chars,
        }
    }

    /// 向模型请求答案并转换成计划声明的形态
    ///
    /// 只有模型调用失败或回复为空时才返回错误，转换本身不会失败
    pub async fn resolve(&self, plan: &Plan, data: &[AcquiredDatum]) -> AppResult<Answer> {
        let prompt = self.build_prompt(plan, data);
        let reply = self
            .llm
            .send_to_llm(&prompt, Some(ANSWER_SYSTEM_PROMPT))
            .await?;

        let raw = reply.trim();
        if raw.is_empty() {
            return Err(QuizError::EmptyModelResponse {
                model: self.llm.model_name().to_string(),
            });
        }
        info!("💡 模型答案: {}", truncate_text(raw, 200));

        let answer = match AnswerShape::classify(&plan.answer_format) {
            AnswerShape::Image => self.render_chart(plan, data, raw),
            shape => coerce_answer(shape, raw),
        };
        Ok(answer)
    }

    pub fn build_prompt(&self, plan: &Plan, data: &[AcquiredDatum]) -> String {
        let preview = if data.is_empty() {
            "No data downloaded".to_string()
        } else {
            let serialized = serde_json::to_string(data).unwrap_or_default();
            char_prefix(&serialized, self.data_preview_chars).to_string()
        };

        format!(
            "Given this task: {}\n\
             Analysis needed: {}\n\
             Expected answer format: {}\n\n\
             Downloaded data summary: {}\n\n\
             Provide the EXACT answer value that should go into the 'answer' field of the submission JSON.\n\
             - For numbers: return just the number (e.g., 42 or 3.14)\n\
             - For strings: return just the string\n\
             - For JSON objects: return the complete object\n\
             - For boolean: return true or false\n\
             Do NOT return the entire submission payload, only the answer value itself.",
            plan.question, plan.analysis_needed, plan.answer_format, preview
        )
    }

    fn render_chart(&self, plan: &Plan, data: &[AcquiredDatum], raw: &str) -> Answer {
        let Some(chart) = ChartData::select(data) else {
            warn!("⚠️ 没有可作图的数据，按文本提交");
            return Answer::Text(raw.to_string());
        };

        let kind = ChartKind::infer(raw);
        match self.charts.render(&chart, kind, &chart_title(&plan.question)) {
            Ok(uri) => {
                info!("✓ 图表生成成功 ({:?})", kind);
                Answer::Image(uri)
            }
            Err(e) => {
                warn!("⚠️ 图表生成失败，按文本提交: {}", e);
                Answer::Text(raw.to_string())
            }
        }
    }
}

fn chart_title(question: &str) -> String {
    let title = char_prefix(question.trim(), 50);
    if title.is_empty() {
        "Chart".to_string()
    } else {
        title.to_string()
    }
}

/// 非图片形态的答案转换
///
/// 图片需要数据和渲染器，这里只能退回文本
pub fn coerce_answer(shape: AnswerShape, raw: &str) -> Answer {
    match shape {
        AnswerShape::Number => coerce_number(raw),
        AnswerShape::Boolean => coerce_boolean(raw),
        AnswerShape::Object => coerce_object(raw),
        AnswerShape::Text | AnswerShape::Image => Answer::Text(raw.to_string()),
    }
}

/// 取第一个数字；带小数点为浮点数，超出 i64 范围的整数也按浮点数处理
pub fn coerce_number(raw: &str) -> Answer {
    let Some(token) = NUMBER_RE.find(raw).map(|m| m.as_str()) else {
        warn!("⚠️ 回复中没有数字: {}", truncate_text(raw, 100));
        return Answer::Text(raw.to_string());
    };

    if !token.contains('.') {
        if let Ok(integer) = token.parse::<i64>() {
            return Answer::Integer(integer);
        }
    }
    match token.parse::<f64>() {
        Ok(float) => Answer::Float(float),
        Err(_) => Answer::Text(raw.to_string()),
    }
}

pub fn coerce_boolean(raw: &str) -> Answer {
    let lower = raw.to_lowercase();
    Answer::Boolean(lower.contains("true") || lower.contains("yes"))
}

/// 第一个 `{` 到最后一个 `}` 之间的 JSON；失败时按文本提交
pub fn coerce_object(raw: &str) -> Answer {
    match braced_slice(raw).map(serde_json::from_str::<serde_json::Value>) {
        Some(Ok(value)) => Answer::Object(value),
        Some(Err(e)) => {
            warn!("⚠️ JSON 答案解析失败: {}", e);
            Answer::Text(raw.to_string())
        }
        None => {
            warn!("⚠️ 回复中没有 JSON 对象: {}", truncate_text(raw, 100));
            Answer::Text(raw.to_string())
        }
    }
}
