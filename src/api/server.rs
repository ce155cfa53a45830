//! 接收端 - 对外接口
//!
//! `POST /quiz` 校验请求后把任务交给调度器立即返回；
//! 解题过程中的任何失败都只写日志，不会回到调用方。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, QuizError};
use crate::orchestrator::{ChainDispatcher, ChainTask};
use crate::workflow::Credentials;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: ChainDispatcher,
}

/// 解题请求体，字段缺失在处理函数中逐个校验
#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/quiz", post(accept_quiz))
        .route("/health", get(health))
        .with_state(state)
}

/// 绑定地址并运行接收端，直到进程退出
pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("🌐 接收端监听 http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn accept_quiz(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let request = parse_request(payload)?;

    if request.secret.as_deref() != Some(state.config.secret.as_str()) {
        warn!("⚠️ 密钥校验失败");
        return Err(QuizError::Auth);
    }

    let url = request
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| QuizError::Validation("Missing URL".to_string()))?;

    let email = request
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .unwrap_or_else(|| state.config.email.clone());

    state.dispatcher.dispatch(ChainTask {
        credentials: Credentials {
            email,
            secret: state.config.secret.clone(),
        },
        url: url.clone(),
    })?;
    info!("📨 已接收解题请求: {}", url);

    Ok(Json(json!({
        "status": "accepted",
        "message": "Quiz solving process started"
    })))
}

/// 非对象、空对象或字段类型不对都按 "Invalid JSON" 处理
fn parse_request(payload: Result<Json<Value>, JsonRejection>) -> AppResult<QuizRequest> {
    let invalid = || QuizError::Validation("Invalid JSON".to_string());

    let Json(value) = payload.map_err(|e| {
        warn!("⚠️ 请求体无法解析: {}", e);
        invalid()
    })?;
    match value.as_object() {
        Some(object) if !object.is_empty() => {}
        _ => return Err(invalid()),
    }

    serde_json::from_value(value).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn app(capacity: usize) -> (Router, mpsc::Receiver<ChainTask>) {
        let (dispatcher, rx) = ChainDispatcher::detached(capacity);
        let config = Config {
            email: "default@example.com".into(),
            secret: "s3cret".into(),
            ..Config::default()
        };
        let state = AppState {
            config: Arc::new(config),
            dispatcher,
        };
        (create_router(state), rx)
    }

    async fn post_quiz(router: &Router, body: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quiz")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_accepts_valid_request() {
        let (router, mut rx) = app(4);
        let (status, body) = post_quiz(
            &router,
            r#"{"email":"me@example.com","secret":"s3cret","url":"https://ex.com/q1"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["message"], "Quiz solving process started");

        let task = rx.recv().await.unwrap();
        assert_eq!(task.url, "https://ex.com/q1");
        assert_eq!(task.credentials.email, "me@example.com");
    }

    #[tokio::test]
    async fn test_missing_email_uses_configured_email() {
        let (router, mut rx) = app(4);
        let (status, _) =
            post_quiz(&router, r#"{"secret":"s3cret","url":"https://ex.com/q1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rx.recv().await.unwrap().credentials.email, "default@example.com");
    }

    #[tokio::test]
    async fn test_invalid_json_variants() {
        let (router, _rx) = app(4);
        for body in ["not json", "{}", "[1,2]", r#"{"secret": 5}"#] {
            let (status, json) = post_quiz(&router, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json["error"], "Invalid JSON");
        }
    }

    #[tokio::test]
    async fn test_wrong_secret_is_forbidden() {
        let (router, _rx) = app(4);
        let (status, json) =
            post_quiz(&router, r#"{"secret":"nope","url":"https://ex.com/q1"}"#).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "Invalid secret");
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let (router, _rx) = app(4);
        let (status, json) = post_quiz(&router, r#"{"secret":"s3cret","url":"  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing URL");
    }

    #[tokio::test]
    async fn test_full_queue_is_unavailable() {
        let (router, _rx) = app(1);
        let body = r#"{"secret":"s3cret","url":"https://ex.com/q1"}"#;
        assert_eq!(post_quiz(&router, body).await.0, StatusCode::OK);
        assert_eq!(
            post_quiz(&router, body).await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _rx) = app(1);
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
