use serde::{Deserialize, Serialize};

/// LLM 对题目页面的结构化解读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub question: String,

    /// 需要下载的数据源，按出现顺序
    #[serde(default, deserialize_with = "deserialize_sources")]
    pub data_sources: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub analysis_needed: String,

    /// 修复后为绝对地址；为空表示计划不可用
    #[serde(default, deserialize_with = "deserialize_text")]
    pub submit_url: String,

    /// 声明的答案格式原文，见 `AnswerShape::classify`
    #[serde(default, deserialize_with = "deserialize_text")]
    pub answer_format: String,

    /// 解析失败时的错误计划标记
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Plan {
    /// 构造错误计划
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// 是否可以继续求解并提交
    pub fn is_usable(&self) -> bool {
        !self.is_error() && !self.submit_url.trim().is_empty()
    }
}

// 模型输出的字段类型并不稳定：null、数字、字符串都可能出现
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, boolean or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

// 接受单个字符串、字符串数组或 null；数组中的非字符串项直接丢弃
fn deserialize_sources<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let sources = match value {
        serde_json::Value::String(s) => vec![s],
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(sources
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_deserializes_full_object() {
        let plan: Plan = serde_json::from_value(json!({
            "question": "What is the sum?",
            "data_sources": ["https://example.com/data.csv"],
            "analysis_needed": "sum column value",
            "submit_url": "https://example.com/submit",
            "answer_format": "number"
        }))
        .unwrap();

        assert_eq!(plan.data_sources, vec!["https://example.com/data.csv"]);
        assert_eq!(plan.answer_format, "number");
        assert!(plan.is_usable());
    }

    #[test]
    fn test_plan_tolerates_loose_types() {
        let plan: Plan = serde_json::from_value(json!({
            "question": null,
            "data_sources": "https://example.com/a.pdf",
            "submit_url": "/submit",
            "answer_format": 42
        }))
        .unwrap();

        assert_eq!(plan.question, "");
        assert_eq!(plan.data_sources, vec!["https://example.com/a.pdf"]);
        assert_eq!(plan.answer_format, "42");
        assert_eq!(plan.analysis_needed, "");
    }

    #[test]
    fn test_plan_drops_non_string_sources() {
        let plan: Plan = serde_json::from_value(json!({
            "data_sources": ["a.csv", 3, null, {"url": "b.csv"}, "  "],
            "submit_url": "https://x/submit"
        }))
        .unwrap();
        assert_eq!(plan.data_sources, vec!["a.csv"]);
    }

    #[test]
    fn test_error_plan_is_not_usable() {
        let plan = Plan::error("Could not parse JSON");
        assert!(plan.is_error());
        assert!(!plan.is_usable());

        let empty_submit = Plan {
            question: "q".into(),
            ..Plan::default()
        };
        assert!(!empty_submit.is_usable());
    }
}
