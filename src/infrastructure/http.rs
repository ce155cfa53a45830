//! HTTP 客户端构建 - 基础设施层

use std::time::Duration;

use reqwest::Client;

use crate::error::{AppResult, QuizError};

const USER_AGENT: &str = concat!("quiz-chain-solver/", env!("CARGO_PKG_VERSION"));

/// 创建带整体超时的 HTTP 客户端
pub fn build_http_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(client_build_error)
}

fn client_build_error(err: impl ToString) -> QuizError {
    QuizError::HttpClient(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_client_build_error_has_no_url_context() {
        let message = client_build_error("tls backend unavailable").to_string();
        assert_eq!(message, "无法创建 HTTP 客户端: tls backend unavailable");
        assert!(!message.contains("页面抓取失败"));
    }
}
