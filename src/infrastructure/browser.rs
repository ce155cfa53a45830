//! 无头浏览器 - 基础设施层
//!
//! 每次渲染都启动独立的浏览器进程，返回前完整关闭，不做复用

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{AppResult, QuizError};

/// 关闭浏览器的上限，超时后直接杀进程
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// 页面渲染参数
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub navigation_timeout: Duration,
    /// 导航完成后等待动态内容的时间
    pub settle_delay: Duration,
    pub chrome_executable: Option<String>,
}

/// 启动无头浏览器
///
/// 返回浏览器和后台事件处理任务，调用方负责关闭
async fn launch_headless_browser(options: &RenderOptions) -> AppResult<(Browser, JoinHandle<()>)> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-extensions",
    ]);
    if let Some(path) = &options.chrome_executable {
        builder = builder.chrome_executable(Path::new(path));
    }
    let config = builder
        .build()
        .map_err(|e| QuizError::Browser(format!("配置无头浏览器失败: {e}")))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| QuizError::Browser(format!("启动无头浏览器失败: {e}")))?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, handler_task))
}

/// 用无头浏览器渲染页面并返回 HTML
///
/// 无论成功与否，返回前都会关闭浏览器进程并结束事件任务
pub async fn render_page(url: &str, options: &RenderOptions) -> AppResult<String> {
    let (mut browser, handler_task) = launch_headless_browser(options).await?;

    let result = load_content(&browser, url, options).await;

    shutdown_browser(&mut browser).await;
    handler_task.abort();

    result
}

/// 在期限内等待 `fut`，超时返回浏览器错误
async fn with_deadline<T, E, F>(limit: Duration, what: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<QuizError>,
{
    match timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(QuizError::Browser(format!(
            "{} 超时 ({} 秒)",
            what,
            limit.as_secs()
        ))),
    }
}

/// 关闭浏览器；正常关闭失败或超时都会杀掉进程
async fn shutdown_browser(browser: &mut Browser) {
    let graceful = match timeout(TEARDOWN_TIMEOUT, browser.close()).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("关闭浏览器失败: {}", e);
            false
        }
        Err(_) => {
            warn!("关闭浏览器超时");
            false
        }
    };

    if graceful {
        match timeout(TEARDOWN_TIMEOUT, browser.wait()).await {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => debug!("等待浏览器进程退出失败: {}", e),
            Err(_) => warn!("等待浏览器进程退出超时"),
        }
    }

    match browser.kill().await {
        Some(Err(e)) => warn!("强制结束浏览器进程失败: {}", e),
        Some(Ok(())) => debug!("浏览器进程已强制结束"),
        None => {}
    }
}

async fn load_content(browser: &Browser, url: &str, options: &RenderOptions) -> AppResult<String> {
    let navigation = async {
        let page = browser.new_page("about:blank").await?;
        page.goto(url).await?;
        page.wait_for_navigation().await?;
        Ok::<_, chromiumoxide::error::CdpError>(page)
    };

    let page = with_deadline(options.navigation_timeout, &format!("导航到 {url}"), navigation)
        .await
        .inspect_err(|e| warn!("导航失败: {}", e))?;

    sleep(options.settle_delay).await;

    let content = with_deadline(
        options.navigation_timeout,
        &format!("读取 {url} 页面内容"),
        page.content(),
    )
    .await;

    match timeout(TEARDOWN_TIMEOUT, page.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("关闭页面失败: {}", e),
        Err(_) => debug!("关闭页面超时"),
    }

    let html = content?;
    info!("✅ 页面渲染完成: {} ({} 字符)", url, html.len());
    Ok(html)
}
