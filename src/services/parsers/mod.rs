//! 各格式解析器
//!
//! 纯数据转换：字节 → `AcquiredDatum`，不做任何网络或流程控制

pub mod excel;
pub mod html;
pub mod pdf;
pub mod tabular;

use phf::phf_map;
use serde_json::Value;

use crate::error::{AppResult, QuizError};
use crate::models::{AcquiredDatum, DataKind};

/// URL 后缀 → 内容类型
static SUFFIX_KINDS: phf::Map<&'static str, DataKind> = phf_map! {
    "pdf" => DataKind::Pdf,
    "csv" => DataKind::Csv,
    "json" => DataKind::Json,
    "xlsx" => DataKind::Excel,
    "xls" => DataKind::Excel,
    "html" => DataKind::Html,
    "htm" => DataKind::Html,
};

/// 推断下载内容的类型：先看 Content-Type，再看 URL 路径后缀
pub fn detect_kind(content_type: &str, url: &str) -> DataKind {
    let content_type = content_type.to_lowercase();
    if content_type.contains("pdf") {
        return DataKind::Pdf;
    }
    if content_type.contains("csv") {
        return DataKind::Csv;
    }
    if content_type.contains("json") {
        return DataKind::Json;
    }
    if content_type.contains("excel") || content_type.contains("spreadsheetml") {
        return DataKind::Excel;
    }
    if content_type.contains("html") {
        return DataKind::Html;
    }

    url_suffix(url)
        .and_then(|suffix| SUFFIX_KINDS.get(suffix.as_str()).copied())
        .unwrap_or(DataKind::RawText)
}

fn url_suffix(raw: &str) -> Option<String> {
    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let file_name = path.rsplit('/').next()?;
    let (_, suffix) = file_name.rsplit_once('.')?;
    Some(suffix.to_lowercase())
}

/// 按类型解析下载内容
pub fn parse(kind: DataKind, bytes: &[u8]) -> AppResult<AcquiredDatum> {
    match kind {
        DataKind::Pdf => pdf::parse_pdf(bytes),
        DataKind::Csv => tabular::parse_csv(bytes),
        DataKind::Json => Ok(AcquiredDatum::Json {
            value: serde_json::from_slice(bytes)?,
        }),
        DataKind::Excel => excel::parse_excel(bytes),
        DataKind::Html => Ok(html::parse_html(&String::from_utf8_lossy(bytes))),
        DataKind::RawText => Ok(AcquiredDatum::RawText {
            text: String::from_utf8_lossy(bytes).into_owned(),
        }),
    }
}

/// 单元格文本 → JSON 值（整数、浮点、布尔、空值，否则字符串）
pub fn infer_cell(raw: &str) -> Value {
    let text = raw.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match text.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

pub(crate) fn parse_error(kind: &str, err: impl ToString) -> QuizError {
    QuizError::acquisition_failed("", format!("{kind} 解析失败: {}", err.to_string()))
}
