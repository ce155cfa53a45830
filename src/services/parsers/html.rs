//! HTML 解析：可见文本 + 所有 `<table>`

use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;

use super::infer_cell;
use crate::models::{AcquiredDatum, Table};

const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

pub fn parse_html(source: &str) -> AcquiredDatum {
    let document = Html::parse_document(source);

    AcquiredDatum::Html {
        text: visible_text(&document),
        tables: extract_tables(&document),
    }
}

/// 页面中的可见文本，空白折叠为单个空格
pub fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    parts.join(" ")
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    parts.push(collapsed);
                }
            }
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, parts);
                }
            }
            _ => {}
        }
    }
}

fn extract_tables(document: &Html) -> Vec<Table> {
    // 选择器是常量，解析不会失败
    let (Ok(table_sel), Ok(row_sel), Ok(cell_sel)) = (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("th, td"),
    ) else {
        return Vec::new();
    };

    document
        .select(&table_sel)
        .filter_map(|table| {
            let mut rows: Vec<ElementRef<'_>> = table.select(&row_sel).collect();
            if rows.is_empty() {
                return None;
            }

            // 首行作为表头，不论是否使用 th
            let header_row = rows.remove(0);
            let columns: Vec<String> = header_row.select(&cell_sel).map(cell_text).collect();

            let mut body: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
            for row in rows {
                let cells: Vec<Value> = row
                    .select(&cell_sel)
                    .map(|cell| infer_cell(&cell_text(cell)))
                    .collect();
                if !cells.is_empty() {
                    body.push(cells);
                }
            }

            Some(Table {
                columns,
                rows: body,
            })
        })
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
        <html>
          <head><style>body { color: red; }</style><script>var secret = 1;</script></head>
          <body>
            <h1>Quiz   7</h1>
            <p>Sum the <b>value</b> column.</p>
            <table>
              <tr><th>item</th><th>value</th></tr>
              <tr><td>a</td><td>3</td></tr>
              <tr><td>b</td><td>4.5</td></tr>
            </table>
          </body>
        </html>"#;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        match parse_html(PAGE) {
            AcquiredDatum::Html { text, .. } => {
                assert!(text.contains("Quiz 7"));
                assert!(text.contains("Sum the value column."));
                assert!(!text.contains("secret"));
                assert!(!text.contains("color"));
            }
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn test_tables_use_header_row() {
        match parse_html(PAGE) {
            AcquiredDatum::Html { tables, .. } => {
                assert_eq!(tables.len(), 1);
                assert_eq!(tables[0].columns, vec!["item", "value"]);
                assert_eq!(
                    tables[0].rows,
                    vec![vec![json!("a"), json!(3)], vec![json!("b"), json!(4.5)]]
                );
            }
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn test_table_without_th_uses_first_row() {
        let html = "<table><tr><td>x</td><td>y</td></tr><tr><td>1</td><td>2</td></tr></table>";
        match parse_html(html) {
            AcquiredDatum::Html { tables, .. } => {
                assert_eq!(tables[0].columns, vec!["x", "y"]);
                assert_eq!(tables[0].rows, vec![vec![json!(1), json!(2)]]);
            }
            other => panic!("unexpected datum: {other:?}"),
        }
    }
}
