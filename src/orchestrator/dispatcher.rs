//! 题目链调度器 - 编排层
//!
//! 接收端只负责把任务放进有界队列，立即返回；
//! 调度任务从队列取出请求，用 Semaphore 限制同时运行的链数，
//! 每条链在独立的 tokio 任务中执行，结果只写日志。

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::error::{AppResult, QuizError};
use crate::orchestrator::chain_controller::ChainController;
use crate::workflow::{Credentials, QuizSession};

/// 一次解题请求
#[derive(Debug, Clone)]
pub struct ChainTask {
    pub credentials: Credentials,
    pub url: String,
}

#[derive(Clone)]
pub struct ChainDispatcher {
    tx: mpsc::Sender<ChainTask>,
}

impl ChainDispatcher {
    /// 启动调度任务，必须在 tokio 运行时中调用
    pub fn start(controller: Arc<ChainController>, max_concurrent: usize, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<ChainTask>(capacity.max(1));
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let controller = controller.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    let session = QuizSession::new(task.credentials, task.url);
                    let report = controller.run_chain(session).await;
                    info!("📊 解题链汇总: {}", report);
                });
            }
            info!("调度器已停止");
        });

        Self { tx }
    }

    /// 非阻塞地提交任务；队列已满时返回 `Busy`
    pub fn dispatch(&self, task: ChainTask) -> AppResult<()> {
        self.tx.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) => {
                warn!("⚠️ 队列已满，拒绝: {}", task.url);
                QuizError::Busy
            }
            TrySendError::Closed(task) => {
                warn!("⚠️ 调度器已停止，拒绝: {}", task.url);
                QuizError::Busy
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn detached(capacity: usize) -> (Self, mpsc::Receiver<ChainTask>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}
