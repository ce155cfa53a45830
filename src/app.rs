//! 应用装配
//!
//! 根据配置组装各层组件，提供 `serve` 和 `solve_once` 两个入口

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::orchestrator::{ChainController, ChainDispatcher, ChainLimits, ChainReport};
use crate::utils::logging::log_startup;
use crate::workflow::{Credentials, QuizFlow, QuizSession};

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    controller: Arc<ChainController>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let flow = QuizFlow::from_config(&config)?;
        let controller = ChainController::new(flow, ChainLimits::from_config(&config));

        Ok(Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
        })
    }

    /// 启动调度器和接收端；`bind` 为空时使用配置中的地址
    pub async fn serve(&self, bind: Option<&str>) -> Result<()> {
        let dispatcher = ChainDispatcher::start(
            self.controller.clone(),
            self.config.max_concurrent_chains,
            self.config.chain_queue_capacity,
        );
        let state = AppState {
            config: self.config.clone(),
            dispatcher,
        };

        api::serve(bind.unwrap_or(self.config.bind_addr.as_str()), state).await
    }

    /// 在当前任务中跑完一条链
    pub async fn solve_once(&self, url: &str, email: Option<String>) -> ChainReport {
        let credentials = Credentials {
            email: email.unwrap_or_else(|| self.config.email.clone()),
            secret: self.config.secret.clone(),
        };
        info!("🧩 单次求解: {} ({})", url, credentials.email);

        self.controller
            .run_chain(QuizSession::new(credentials, url))
            .await
    }
}
