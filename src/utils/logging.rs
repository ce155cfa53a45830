/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则默认 `info`，详细模式下为 `debug`。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!(
        "📊 单链上限: {} 步 / {} 秒, 最大并发链: {}",
        config.max_steps, config.time_budget_secs, config.max_concurrent_chains
    );
    info!("{}", "=".repeat(60));
}

/// 记录解题链开始
pub fn log_chain_start(url: &str) {
    info!("\n{}", "=".repeat(60));
    info!("🧩 开始解题链: {}", url);
    info!("{}", "=".repeat(60));
}

/// 记录解题链结束
pub fn log_chain_complete(steps: u32, reason: &str, elapsed: Duration) {
    info!("\n{}", "─".repeat(60));
    info!(
        "🏁 解题链结束: 共 {} 步, 原因: {}, 耗时 {:.1} 秒",
        steps,
        reason,
        elapsed.as_secs_f64()
    );
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 按字符数截取前缀，不追加省略号
///
/// 用于拼接提示词，保证不会切在多字节字符中间
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
