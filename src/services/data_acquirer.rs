//! 数据获取服务 - 业务能力层
//!
//! 下载单个数据源并按内容类型解析，不关心流程

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, QuizError};
use crate::infrastructure::build_http_client;
use crate::models::AcquiredDatum;
use crate::services::parsers;

/// 获取并解析数据源的能力
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn acquire(&self, url: &str) -> AppResult<AcquiredDatum>;
}

pub struct DataAcquirer {
    http: Client,
}

impl DataAcquirer {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(config.http_timeout())?,
        })
    }
}

#[async_trait]
impl DataSource for DataAcquirer {
    async fn acquire(&self, url: &str) -> AppResult<AcquiredDatum> {
        info!("📥 下载数据: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| QuizError::acquisition_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizError::acquisition_failed(
                url,
                format!("状态码 {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let kind = parsers::detect_kind(&content_type, url);
        if kind == crate::models::DataKind::RawText {
            warn!("未知内容类型 '{}'，按纯文本处理: {}", content_type, url);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| QuizError::acquisition_failed(url, e))?;
        debug!("数据 {} 大小 {} 字节, 类型 {:?}", url, bytes.len(), kind);

        parsers::parse(kind, &bytes).map_err(|e| match e {
            QuizError::Acquisition { message, .. } => QuizError::Acquisition {
                url: url.to_string(),
                message,
            },
            other => QuizError::acquisition_failed(url, other),
        })
    }
}
