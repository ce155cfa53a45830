//! Excel 解析（xlsx / xls / ods）

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;

use super::parse_error;
use crate::error::AppResult;
use crate::models::{AcquiredDatum, Sheet, Table};

/// 解析所有工作表，每个表的首行作为表头
pub fn parse_excel(bytes: &[u8]) -> AppResult<AcquiredDatum> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| parse_error("Excel", e))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| parse_error("Excel", e))?;

        let mut rows = range.rows();
        let columns = rows
            .next()
            .map(|header| header.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default();
        let table = Table {
            columns,
            rows: rows.map(|row| row.iter().map(cell_value).collect()).collect(),
        };

        sheets.push(Sheet {
            name,
            summary: table.summary(),
            table,
        });
    }

    Ok(AcquiredDatum::Excel { sheets })
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(*f as i64),
        Data::Float(f) => Value::from(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Int(3)), json!(3));
        assert_eq!(cell_value(&Data::Float(4.0)), json!(4));
        assert_eq!(cell_value(&Data::Float(4.5)), json!(4.5));
        assert_eq!(cell_value(&Data::String("x".into())), json!("x"));
    }

    #[test]
    fn test_invalid_workbook_is_error() {
        assert!(parse_excel(b"definitely not a workbook").is_err());
    }
}
