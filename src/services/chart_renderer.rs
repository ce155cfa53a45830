//! 图表生成 - 业务能力层
//!
//! 纯函数：结构化数据 + 图表类型 → PNG data URI

use std::error::Error;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use plotters::coord::ranged1d::SegmentValue;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppResult, QuizError};
use crate::models::{AcquiredDatum, Table};

/// 图表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    /// 根据模型回复中的关键词推断图表类型
    pub fn infer(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("pie") {
            ChartKind::Pie
        } else if lower.contains("line") || lower.contains("trend") || lower.contains("time") {
            ChartKind::Line
        } else {
            ChartKind::Bar
        }
    }
}

/// 带标签的数值序列
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 从下载的数据中挑选第一份可作图的数据
    ///
    /// 表格类（CSV、Excel 第一个工作表）优先，其次是 JSON 对象
    pub fn select(data: &[AcquiredDatum]) -> Option<Self> {
        let from_tables = data
            .iter()
            .filter_map(AcquiredDatum::primary_table)
            .find_map(Self::from_table);
        if from_tables.is_some() {
            return from_tables;
        }

        data.iter().find_map(|datum| match datum {
            AcquiredDatum::Json { value } => Self::from_json(value),
            _ => None,
        })
    }

    /// 表格 → 序列
    ///
    /// 标签列取第一个非数值列（没有时：有两个以上数值列则用第一个数值列，
    /// 否则用行号）；数值列取剩下的第一个数值列
    pub fn from_table(table: &Table) -> Option<Self> {
        let width = table
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(table.columns.len());

        let numeric_cols: Vec<usize> = (0..width)
            .filter(|&col| is_numeric_column(table, col))
            .collect();
        let text_col = (0..width).find(|col| !numeric_cols.contains(col));

        let (label_col, value_col) = match (text_col, numeric_cols.as_slice()) {
            (_, []) => return None,
            (Some(label), [value, ..]) => (Some(label), *value),
            (None, [label, value, ..]) => (Some(*label), *value),
            (None, [value]) => (None, *value),
        };

        let mut chart = ChartData {
            labels: Vec::new(),
            values: Vec::new(),
        };
        for (index, row) in table.rows.iter().enumerate() {
            let Some(value) = row.get(value_col).and_then(numeric) else {
                continue;
            };
            let label = match label_col {
                Some(col) => row.get(col).map(label_text).unwrap_or_default(),
                None => (index + 1).to_string(),
            };
            chart.labels.push(label);
            chart.values.push(value);
        }

        (!chart.is_empty()).then_some(chart)
    }

    /// JSON 对象 → 序列，只保留数值（或数值字符串）项
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut chart = ChartData {
            labels: Vec::new(),
            values: Vec::new(),
        };
        for (key, item) in object {
            if let Some(number) = numeric(item) {
                chart.labels.push(key.clone());
                chart.values.push(number);
            }
        }
        (!chart.is_empty()).then_some(chart)
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn is_numeric_column(table: &Table, col: usize) -> bool {
    let mut seen = false;
    for value in table.column(col) {
        match value {
            Value::Null => {}
            other if numeric(other).is_some() => seen = true,
            _ => return false,
        }
    }
    seen
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 图表渲染能力
pub trait ChartRenderer: Send + Sync {
    /// 返回 `data:image/png;base64,...`；数据为空或无法绘制时返回错误
    fn render(&self, data: &ChartData, kind: ChartKind, title: &str) -> AppResult<String>;
}

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// 基于 plotters 的 PNG 渲染器
pub struct PlottersChartRenderer {
    width: u32,
    height: u32,
}

impl Default for PlottersChartRenderer {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl ChartRenderer for PlottersChartRenderer {
    fn render(&self, data: &ChartData, kind: ChartKind, title: &str) -> AppResult<String> {
        if data.is_empty() {
            return Err(QuizError::Chart("没有可绘制的数据".to_string()));
        }
        if kind == ChartKind::Pie && !data.values.iter().any(|v| *v > 0.0) {
            return Err(QuizError::Chart("饼图需要至少一个正数".to_string()));
        }

        let mut buffer = vec![0u8; (self.width * self.height * 3) as usize];
        self.draw(&mut buffer, data, kind, title)
            .map_err(|e| QuizError::Chart(e.to_string()))?;

        let image = image::RgbImage::from_raw(self.width, self.height, buffer)
            .ok_or_else(|| QuizError::Chart("图像缓冲区大小不匹配".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| QuizError::Chart(e.to_string()))?;

        let bytes = png.into_inner();
        debug!("图表生成完成: {:?}, {} 字节", kind, bytes.len());
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }
}

impl PlottersChartRenderer {
    fn draw(
        &self,
        buffer: &mut [u8],
        data: &ChartData,
        kind: ChartKind,
        title: &str,
    ) -> Result<(), Box<dyn Error>> {
        let root = BitMapBackend::with_buffer(buffer, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        match kind {
            ChartKind::Bar => draw_bar(&root, data, title)?,
            ChartKind::Line => draw_line(&root, data, title)?,
            ChartKind::Pie => draw_pie(&root, data, title)?,
        }

        root.present()?;
        Ok(())
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return (min, min + 1.0);
    }
    let pad = (max - min) * 0.1;
    (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
}

fn draw_bar(root: &Area<'_>, data: &ChartData, title: &str) -> Result<(), Box<dyn Error>> {
    let count = data.values.len();
    let (y_min, y_max) = value_range(&data.values);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0..count).into_segmented(), y_min..y_max)?;

    let labels = &data.labels;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&|v: &SegmentValue<usize>| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                labels.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .x_desc("X")
        .y_desc("Y")
        .draw()?;

    chart.draw_series(data.values.iter().enumerate().map(|(i, value)| {
        let (low, high) = if *value >= 0.0 { (0.0, *value) } else { (*value, 0.0) };
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), low), (SegmentValue::Exact(i + 1), high)],
            PALETTE[0].filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    Ok(())
}

fn draw_line(root: &Area<'_>, data: &ChartData, title: &str) -> Result<(), Box<dyn Error>> {
    let count = data.values.len();
    let x_max = count.saturating_sub(1).max(1) as f64;
    let (y_min, y_max) = value_range(&data.values);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

    let labels = &data.labels;
    chart
        .configure_mesh()
        .x_labels(count.min(20))
        .x_label_formatter(&|x: &f64| {
            let index = x.round();
            if (x - index).abs() < 1e-6 && index >= 0.0 {
                labels.get(index as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("X")
        .y_desc("Y")
        .draw()?;

    let points: Vec<(f64, f64)> = data
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), &PALETTE[0]))?;
    chart.draw_series(
        points
            .iter()
            .map(|point| Circle::new(*point, 4, PALETTE[0].filled())),
    )?;

    Ok(())
}

fn draw_pie(root: &Area<'_>, data: &ChartData, title: &str) -> Result<(), Box<dyn Error>> {
    let area = root.titled(title, ("sans-serif", 28))?;

    // 饼图只画正数部分
    let (labels, sizes): (Vec<String>, Vec<f64>) = data
        .labels
        .iter()
        .cloned()
        .zip(data.values.iter().copied())
        .filter(|(_, v)| *v > 0.0)
        .unzip();
    let colors: Vec<RGBColor> = (0..sizes.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
    area.draw(&pie)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_chart_kind_keywords() {
        assert_eq!(ChartKind::infer("A PIE chart of shares"), ChartKind::Pie);
        assert_eq!(ChartKind::infer("show the trend"), ChartKind::Line);
        assert_eq!(ChartKind::infer("sales over time"), ChartKind::Line);
        assert_eq!(ChartKind::infer("compare regions"), ChartKind::Bar);
    }

    #[test]
    fn test_from_table_uses_text_label_column() {
        let table = Table {
            columns: vec!["region".into(), "sales".into()],
            rows: vec![
                vec![json!("north"), json!(10)],
                vec![json!("south"), json!("7.5")],
                vec![json!("east"), Value::Null],
            ],
        };
        let chart = ChartData::from_table(&table).unwrap();
        assert_eq!(chart.labels, vec!["north", "south"]);
        assert_eq!(chart.values, vec![10.0, 7.5]);
    }

    #[test]
    fn test_from_table_numeric_only_columns() {
        let table = Table {
            columns: vec!["year".into(), "value".into()],
            rows: vec![vec![json!(2020), json!(1)], vec![json!(2021), json!(3)]],
        };
        let chart = ChartData::from_table(&table).unwrap();
        assert_eq!(chart.labels, vec!["2020", "2021"]);
        assert_eq!(chart.values, vec![1.0, 3.0]);

        let single = Table {
            columns: vec!["value".into()],
            rows: vec![vec![json!(4)], vec![json!(5)]],
        };
        let chart = ChartData::from_table(&single).unwrap();
        assert_eq!(chart.labels, vec!["1", "2"]);
    }

    #[test]
    fn test_from_table_without_numbers_is_none() {
        let table = Table {
            columns: vec!["name".into()],
            rows: vec![vec![json!("a")]],
        };
        assert!(ChartData::from_table(&table).is_none());
        assert!(ChartData::from_table(&Table::default()).is_none());
    }

    #[test]
    fn test_select_prefers_tables_over_json() {
        let table = Table {
            columns: vec!["k".into(), "v".into()],
            rows: vec![vec![json!("t"), json!(1)]],
        };
        let data = vec![
            AcquiredDatum::Json {
                value: json!({"j": 2}),
            },
            AcquiredDatum::Csv {
                summary: table.summary(),
                table,
            },
        ];
        let chart = ChartData::select(&data).unwrap();
        assert_eq!(chart.labels, vec!["t"]);

        let json_only = vec![AcquiredDatum::Json {
            value: json!({"a": 1, "b": "x", "c": 2.5}),
        }];
        let chart = ChartData::select(&json_only).unwrap();
        assert_eq!(chart.labels, vec!["a", "c"]);
        assert_eq!(chart.values, vec![1.0, 2.5]);

        assert!(ChartData::select(&[AcquiredDatum::Json { value: json!([1, 2]) }]).is_none());
    }

    #[test]
    fn test_render_rejects_empty_data() {
        let renderer = PlottersChartRenderer::default();
        let empty = ChartData {
            labels: vec![],
            values: vec![],
        };
        assert!(renderer.render(&empty, ChartKind::Bar, "t").is_err());

        let negative = ChartData {
            labels: vec!["a".into()],
            values: vec![-1.0],
        };
        assert!(renderer.render(&negative, ChartKind::Pie, "t").is_err());
    }

    #[test]
    fn test_value_range_includes_zero() {
        assert_eq!(value_range(&[0.0, 0.0]), (0.0, 1.0));
        let (low, high) = value_range(&[2.0, 10.0]);
        assert_eq!(low, 0.0);
        assert!(high > 10.0);
        let (low, _) = value_range(&[-5.0, 5.0]);
        assert!(low < -5.0);
    }

    #[test]
    #[ignore] // 需要系统字体
    fn test_render_all_kinds_to_png_data_uri() {
        let renderer = PlottersChartRenderer::default();
        let data = ChartData {
            labels: vec!["a".into(), "b".into(), "c".into()],
            values: vec![3.0, 1.0, 2.0],
        };
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Pie] {
            let uri = renderer.render(&data, kind, "Test chart").unwrap();
            assert!(uri.starts_with("data:image/png;base64,"));
        }
    }
}
