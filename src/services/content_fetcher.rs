//! 页面抓取服务 - 业务能力层
//!
//! 主策略：无头浏览器渲染（执行页面脚本）
//! 兜底策略：普通 HTTP GET
//! 除这一次兜底外不做任何重试

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppResult, QuizError};
use crate::infrastructure::{build_http_client, render_page, RenderOptions};

/// 获取页面内容的能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

pub struct ContentFetcher {
    render_options: RenderOptions,
    http: Client,
}

impl ContentFetcher {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            render_options: RenderOptions {
                navigation_timeout: config.navigation_timeout(),
                settle_delay: config.settle_delay(),
                chrome_executable: config.chrome_executable.clone(),
            },
            http: build_http_client(config.http_timeout())?,
        })
    }

    async fn fetch_plain(&self, url: &str) -> AppResult<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| QuizError::fetch_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizError::fetch_failed(
                url,
                format!("兜底抓取返回状态码 {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| QuizError::fetch_failed(url, e))
    }
}

#[async_trait]
impl PageFetcher for ContentFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        match render_page(url, &self.render_options).await {
            Ok(html) => return Ok(html),
            Err(e) => warn!("浏览器渲染失败: {}，改用 HTTP 直接抓取", e),
        }

        self.fetch_plain(url).await.map_err(|e| {
            error!("浏览器渲染与 HTTP 抓取均失败: {}", e);
            e
        })
    }
}
