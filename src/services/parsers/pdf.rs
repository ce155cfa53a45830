//! PDF 解析
//!
//! 只提取文本；版面中的表格不做结构化识别，`tables` 恒为空

use super::parse_error;
use crate::error::AppResult;
use crate::models::AcquiredDatum;

pub fn parse_pdf(bytes: &[u8]) -> AppResult<AcquiredDatum> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| parse_error("PDF", e))?;

    // 按换页符切分并标注页码，方便模型定位
    let pages: Vec<String> = text
        .split('\u{c}')
        .map(str::trim)
        .enumerate()
        .filter(|(_, page)| !page.is_empty())
        .map(|(index, page)| format!("Page {}:\n{}", index + 1, page))
        .collect();

    Ok(AcquiredDatum::Pdf {
        text: pages.join("\n\n"),
        tables: Vec::new(),
    })
}
