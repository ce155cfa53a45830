//! 尽力而为的结构化提取
//!
//! LLM 的回复经常在 JSON 前后夹带说明文字或 ```json 代码块。
//! 这里把两次尝试拆成独立、可单测的步骤：
//! 1. `parse_strict` - 整段文本直接解析，只接受 JSON 对象
//! 2. `parse_embedded` - 取第一个 `{` 到最后一个 `}` 之间的子串再解析
//!
//! `extract_structured` 依次执行两步，都失败时返回明确的 `ExtractError`。

use serde_json::Value;
use thiserror::Error;

/// 结构化提取失败
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 文本中找不到成对的大括号
    #[error("文本中没有找到 JSON 对象")]
    NoObject,
    /// 找到了大括号，但内容不是合法 JSON
    #[error("内嵌 JSON 解析失败: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// 整段文本按 JSON 解析
pub fn parse_strict(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text.trim())
}

/// 第一个 `{` 到最后一个 `}`（含）之间的子串
pub fn braced_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// 解析文本中内嵌的 JSON 对象
pub fn parse_embedded(text: &str) -> Result<Value, ExtractError> {
    let slice = braced_slice(text).ok_or(ExtractError::NoObject)?;
    Ok(serde_json::from_str(slice)?)
}

/// 先严格解析，失败或结果不是对象时再尝试内嵌对象
pub fn extract_structured(text: &str) -> Result<Value, ExtractError> {
    match parse_strict(text) {
        Ok(value) if value.is_object() => Ok(value),
        _ => parse_embedded(text),
    }
}
