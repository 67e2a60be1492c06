//! 批量投递处理器 - 编排层
//!
//! ## 职责
//!
//! 在一个页面会话上按顺序投递一组岗位：
//!
//! 1. **选择适配器**：按 `job.source` 找到门户适配器，没有则记为 `UnsupportedPortal`（不触碰页面）
//! 2. **驱动流程**：为每个岗位新建 `ApplicationContext`，交给 `ApplicationFlow`
//! 3. **故障隔离**：单个岗位失败（包括适配器 panic）不影响后续岗位
//! 4. **批次中止**：`SessionLost` / `Cancelled` 中止剩余岗位并单独记录
//! 5. **限速**：两次投递之间等待 `RateLimiter`

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ApplyError;
use crate::infrastructure::{PageDriver, WaitPolicy};
use crate::models::{ApplicationOutcome, BatchReport, JobRecord, PortalKind, StepState};
use crate::orchestrator::rate_limiter::RateLimiter;
use crate::portals::AdapterRegistry;
use crate::workflow::{Applicant, ApplicationContext, ApplicationFlow};

/// 批量投递编排器
pub struct BatchOrchestrator {
    registry: AdapterRegistry,
    flow: ApplicationFlow,
    rate_limiter: RateLimiter,
}

impl BatchOrchestrator {
    pub fn new(registry: AdapterRegistry, flow: ApplicationFlow, rate_limit: Duration) -> Self {
        Self {
            registry,
            flow,
            rate_limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn from_config(config: &Config, cancel: CancellationToken) -> Self {
        let wait = WaitPolicy::new(config.poll_interval(), cancel);
        Self::new(
            AdapterRegistry::with_defaults(),
            ApplicationFlow::from_config(config, wait),
            config.rate_limit(),
        )
    }

    /// 替换限速器（并行模式下多个会话共享同一个）
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        self.flow.wait_policy()
    }

    /// 按顺序投递全部岗位
    pub async fn run(
        &self,
        driver: &dyn PageDriver,
        jobs: &[JobRecord],
        applicant: Arc<Applicant>,
    ) -> BatchReport {
        let indexed: Vec<(usize, JobRecord)> = jobs.iter().cloned().enumerate().collect();
        self.run_indexed(driver, &indexed, applicant, None).await
    }

    /// 投递带原始下标的岗位（下标只用于日志和合并报告）
    ///
    /// `portal` 标记该会话所属门户，写入中止记录。
    pub async fn run_indexed(
        &self,
        driver: &dyn PageDriver,
        jobs: &[(usize, JobRecord)],
        applicant: Arc<Applicant>,
        portal: Option<PortalKind>,
    ) -> BatchReport {
        let mut report = BatchReport::new();
        let total = jobs.len();

        for (position, (index, job)) in jobs.iter().enumerate() {
            let job_number = index + 1;

            let Some(adapter) = self.registry.get(job.source()) else {
                warn!("[岗位 #{}] ⚠️ 不支持的门户，跳过: {}", job_number, job.url());
                report.record(unsupported_outcome(job));
                continue;
            };

            if let Err(reason) = self.rate_limiter.acquire(self.flow.wait_policy()).await {
                log_abort(portal, &reason, total - position);
                report.abort(portal, reason, total - position);
                break;
            }

            log_job_start(job_number, job);
            let ctx = ApplicationContext::new(job.clone(), job_number, applicant.clone());
            let outcome = match AssertUnwindSafe(self.flow.run(adapter.as_ref(), driver, ctx))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("[岗位 #{}] 💥 适配器 panic: {}", job_number, message);
                    ApplicationOutcome::failed(
                        job.clone(),
                        ApplyError::Internal(message),
                        vec![StepState::NotStarted, StepState::Failed],
                    )
                }
            };
            self.rate_limiter.finish().await;

            let fatal = outcome
                .failure_reason
                .clone()
                .filter(ApplyError::is_batch_fatal);
            report.record(outcome);

            if let Some(reason) = fatal {
                let remaining = total - position - 1;
                log_abort(portal, &reason, remaining);
                report.abort(portal, reason, remaining);
                break;
            }
        }

        report
    }
}

/// 没有适配器的岗位直接记为失败
pub fn unsupported_outcome(job: &JobRecord) -> ApplicationOutcome {
    ApplicationOutcome::failed(
        job.clone(),
        ApplyError::UnsupportedPortal {
            url: job.url().to_string(),
        },
        vec![StepState::NotStarted, StepState::Failed],
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ========== 日志辅助函数 ==========

fn log_job_start(job_number: usize, job: &JobRecord) {
    info!("\n{}", "─".repeat(60));
    info!("[岗位 #{}] 🎯 {}", job_number, job);
    info!("{}", "─".repeat(60));
}

fn log_abort(portal: Option<PortalKind>, reason: &ApplyError, remaining: usize) {
    match portal {
        Some(portal) => error!(
            "[{}] 🛑 会话中止: {}，剩余 {} 个岗位未投递",
            portal, reason, remaining
        ),
        None => error!("🛑 批次中止: {}，剩余 {} 个岗位未投递", reason, remaining),
    }
}
