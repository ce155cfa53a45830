use serde::Serialize;
use serde_json::Value;

/// 下载内容的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Pdf,
    Csv,
    Json,
    Excel,
    Html,
    RawText,
}

/// 二维表：表头 + 行，单元格统一为 JSON 值
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按列名顺序取第 `index` 列
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| row.get(index).unwrap_or(&Value::Null))
    }

    /// 表格概要（行数、列名、前 5 行）
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            rows: self.rows.len(),
            columns: self.columns.clone(),
            head: self.rows.iter().take(5).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub head: Vec<Vec<Value>>,
}

/// Excel 中的一个工作表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
    pub summary: TableSummary,
}

/// 数据源下载并解析后的结果，创建后只读
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcquiredDatum {
    Pdf { text: String, tables: Vec<Table> },
    Csv { table: Table, summary: TableSummary },
    Json { value: Value },
    Excel { sheets: Vec<Sheet> },
    Html { text: String, tables: Vec<Table> },
    RawText { text: String },
}

impl AcquiredDatum {
    pub fn kind(&self) -> DataKind {
        match self {
            AcquiredDatum::Pdf { .. } => DataKind::Pdf,
            AcquiredDatum::Csv { .. } => DataKind::Csv,
            AcquiredDatum::Json { .. } => DataKind::Json,
            AcquiredDatum::Excel { .. } => DataKind::Excel,
            AcquiredDatum::Html { .. } => DataKind::Html,
            AcquiredDatum::RawText { .. } => DataKind::RawText,
        }
    }

    /// 可直接作图的主表：CSV 的表，或 Excel 的第一个工作表
    pub fn primary_table(&self) -> Option<&Table> {
        match self {
            AcquiredDatum::Csv { table, .. } => Some(table),
            AcquiredDatum::Excel { sheets } => sheets.first().map(|sheet| &sheet.table),
            _ => None,
        }
    }
}
