//! CSV 解析

use csv::ReaderBuilder;

use super::{infer_cell, parse_error};
use crate::error::AppResult;
use crate::models::{AcquiredDatum, Table};

/// 解析 CSV：首行为表头，单元格做类型推断，允许行长度不一致
pub fn parse_csv(bytes: &[u8]) -> AppResult<AcquiredDatum> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error("CSV", e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error("CSV", e))?;
        rows.push(record.iter().map(infer_cell).collect());
    }

    let table = Table { columns, rows };
    Ok(AcquiredDatum::Csv {
        summary: table.summary(),
        table,
    })
}
