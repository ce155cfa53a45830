use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quiz_chain_solver::models::{AcquiredDatum, DataKind};
use quiz_chain_solver::services::{DataAcquirer, DataSource};
use quiz_chain_solver::{Config, QuizError};

async fn serve(server: &MockServer, route: &str, body: &[u8], mime: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), mime))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_csv_by_content_type() {
    let server = MockServer::start().await;
    serve(&server, "/data", b"name,value\na,1\nb,2.5\n", "text/csv").await;

    let acquirer = DataAcquirer::new(&Config::default()).unwrap();
    let datum = acquirer
        .acquire(&format!("{}/data", server.uri()))
        .await
        .unwrap();

    match datum {
        AcquiredDatum::Csv { table, summary } => {
            assert_eq!(table.columns, vec!["name", "value"]);
            assert_eq!(table.rows[1], vec![json!("b"), json!(2.5)]);
            assert_eq!(summary.rows, 2);
        }
        other => panic!("unexpected datum: {other:?}"),
    }
}

#[tokio::test]
async fn test_suffix_used_when_content_type_is_generic() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/files/report.json",
        br#"{"total": 10}"#,
        "application/octet-stream",
    )
    .await;

    let acquirer = DataAcquirer::new(&Config::default()).unwrap();
    let datum = acquirer
        .acquire(&format!("{}/files/report.json", server.uri()))
        .await
        .unwrap();

    assert_eq!(
        datum,
        AcquiredDatum::Json {
            value: json!({ "total": 10 })
        }
    );
}

#[tokio::test]
async fn test_html_tables_and_raw_text() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/page",
        b"<html><body><p>Hello</p><table><tr><th>k</th></tr><tr><td>1</td></tr></table></body></html>",
        "text/html; charset=utf-8",
    )
    .await;
    serve(&server, "/notes", b"plain notes", "application/x-unknown").await;

    let acquirer = DataAcquirer::new(&Config::default()).unwrap();

    let html = acquirer
        .acquire(&format!("{}/page", server.uri()))
        .await
        .unwrap();
    assert_eq!(html.kind(), DataKind::Html);
    if let AcquiredDatum::Html { text, tables } = html {
        assert!(text.contains("Hello"));
        assert_eq!(tables.len(), 1);
    }

    let raw = acquirer
        .acquire(&format!("{}/notes", server.uri()))
        .await
        .unwrap();
    assert_eq!(
        raw,
        AcquiredDatum::RawText {
            text: "plain notes".into()
        }
    );
}

#[tokio::test]
async fn test_http_error_is_acquisition_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let acquirer = DataAcquirer::new(&Config::default()).unwrap();
    let url = format!("{}/missing.csv", server.uri());
    let err = acquirer.acquire(&url).await.unwrap_err();

    match err {
        QuizError::Acquisition { url: failed, .. } => assert_eq!(failed, url),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_parse_failure_carries_source_url() {
    let server = MockServer::start().await;
    serve(&server, "/bad.json", b"{not json", "application/json").await;

    let acquirer = DataAcquirer::new(&Config::default()).unwrap();
    let url = format!("{}/bad.json", server.uri());
    let err = acquirer.acquire(&url).await.unwrap_err();

    assert!(matches!(err, QuizError::Acquisition { url: ref failed, .. } if failed == &url));
}
