use phf::phf_map;
use serde::Serialize;
use serde_json::Value;

/// 计划中声明的答案形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    Number,
    Text,
    Boolean,
    /// 任意 JSON 对象
    Object,
    /// base64 data URI 图片（图表）
    Image,
}

/// 常见的格式写法 → 答案形态
static SHAPE_ALIASES: phf::Map<&'static str, AnswerShape> = phf_map! {
    "number" => AnswerShape::Number,
    "numeric" => AnswerShape::Number,
    "integer" => AnswerShape::Number,
    "int" => AnswerShape::Number,
    "float" => AnswerShape::Number,
    "string" => AnswerShape::Text,
    "text" => AnswerShape::Text,
    "str" => AnswerShape::Text,
    "boolean" => AnswerShape::Boolean,
    "bool" => AnswerShape::Boolean,
    "json" => AnswerShape::Object,
    "object" => AnswerShape::Object,
    "dict" => AnswerShape::Object,
    "base64_image" => AnswerShape::Image,
    "base64" => AnswerShape::Image,
    "image" => AnswerShape::Image,
    "png" => AnswerShape::Image,
};

impl AnswerShape {
    /// 从计划的 `answer_format` 原文推断形态
    ///
    /// 未知写法一律按文本处理；含 "chart" / "visualization" 的视为图片
    pub fn classify(answer_format: &str) -> Self {
        let normalized = answer_format.trim().to_lowercase();
        if let Some(shape) = SHAPE_ALIASES.get(normalized.as_str()) {
            return *shape;
        }
        if normalized.contains("chart") || normalized.contains("visualization") {
            return AnswerShape::Image;
        }
        AnswerShape::Text
    }
}

/// 提交的答案值
///
/// 以裸值序列化，直接放进提交体的 `answer` 字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Object(Value),
    /// `data:image/png;base64,...`
    Image(String),
}

impl Answer {
    /// 日志用的简短描述
    pub fn preview(&self) -> String {
        match self {
            Answer::Image(uri) => format!("<图片 {} 字节>", uri.len()),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
