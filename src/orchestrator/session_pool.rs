//! 多会话并行投递 - 编排层
//!
//! 一个页面会话只能串行使用，所以并行只发生在会话之间：
//! 按门户分组，每组从 `SessionProvider` 拿一个独立会话，组内仍然串行。
//! 会话数由 Semaphore 限制，限速器在所有会话之间共享。

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::ApplyError;
use crate::infrastructure::PageDriver;
use crate::models::{BatchReport, JobRecord, PortalKind};
use crate::orchestrator::batch_processor::{unsupported_outcome, BatchOrchestrator};
use crate::workflow::Applicant;

/// 会话提供者
///
/// 为某个门户提供一个已登录的页面会话，核心流程不接触凭据。
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self, portal: PortalKind) -> Result<Arc<dyn PageDriver>>;
}

/// 按门户分组并行投递
pub struct SessionPool {
    orchestrator: Arc<BatchOrchestrator>,
    provider: Arc<dyn SessionProvider>,
    max_sessions: usize,
}

impl SessionPool {
    pub fn new(
        orchestrator: Arc<BatchOrchestrator>,
        provider: Arc<dyn SessionProvider>,
        max_sessions: usize,
    ) -> Self {
        Self {
            orchestrator,
            provider,
            max_sessions: max_sessions.max(1),
        }
    }

    /// 投递全部岗位，报告按岗位原始顺序合并
    pub async fn run(&self, jobs: &[JobRecord], applicant: Arc<Applicant>) -> BatchReport {
        let mut groups: BTreeMap<PortalKind, Vec<(usize, JobRecord)>> = BTreeMap::new();
        let mut parts: Vec<(Vec<usize>, BatchReport)> = Vec::new();

        for (index, job) in jobs.iter().enumerate() {
            if self.orchestrator.registry().supports(job.source()) {
                groups
                    .entry(job.source())
                    .or_default()
                    .push((index, job.clone()));
            } else {
                let mut report = BatchReport::new();
                report.record(unsupported_outcome(job));
                parts.push((vec![index], report));
            }
        }

        info!(
            "🔀 并行模式: {} 个门户会话，最多同时 {} 个",
            groups.len(),
            self.max_sessions
        );

        let semaphore = Arc::new(Semaphore::new(self.max_sessions));
        let mut handles = Vec::new();

        for (portal, group) in groups {
            let indices: Vec<usize> = group.iter().map(|(i, _)| *i).collect();
            let orchestrator = self.orchestrator.clone();
            let provider = self.provider.clone();
            let applicant = applicant.clone();
            let semaphore = semaphore.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return BatchReport::new();
                };
                run_session(&orchestrator, provider.as_ref(), portal, &group, applicant).await
            });
            handles.push((portal, indices, handle));
        }

        for (portal, indices, handle) in handles {
            match handle.await {
                Ok(report) => parts.push((indices, report)),
                Err(e) => {
                    error!("[{}] 会话任务执行失败: {}", portal, e);
                    let mut report = BatchReport::new();
                    report.abort(
                        Some(portal),
                        ApplyError::Internal(e.to_string()),
                        indices.len(),
                    );
                    parts.push((indices, report));
                }
            }
        }

        BatchReport::merge(parts)
    }
}

async fn run_session(
    orchestrator: &BatchOrchestrator,
    provider: &dyn SessionProvider,
    portal: PortalKind,
    group: &[(usize, JobRecord)],
    applicant: Arc<Applicant>,
) -> BatchReport {
    if orchestrator.wait_policy().is_cancelled() {
        let mut report = BatchReport::new();
        report.abort(Some(portal), ApplyError::Cancelled, group.len());
        return report;
    }

    let driver = match provider.open_session(portal).await {
        Ok(driver) => driver,
        Err(e) => {
            error!("[{}] ❌ 无法打开会话: {:#}", portal, e);
            let mut report = BatchReport::new();
            report.abort(
                Some(portal),
                ApplyError::SessionLost(format!("{:#}", e)),
                group.len(),
            );
            return report;
        }
    };

    info!("[{}] 🌐 会话已就绪，{} 个岗位", portal, group.len());
    orchestrator
        .run_indexed(driver.as_ref(), group, applicant, Some(portal))
        .await
}
