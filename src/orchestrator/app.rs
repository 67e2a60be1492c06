//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：打开浏览器会话、安装取消信号（Ctrl-C / 运行超时）
//! 2. **抓取阶段**：搜索各门户，增量去重后写入岗位列表文件
//! 3. **投递阶段**：读取岗位列表，串行或按门户并行投递，写出报告
//!
//! 本模块是唯一持有 `BrowserSession` 的地方。

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::browser::{BrowserSession, ChromeSessionProvider};
use crate::config::Config;
use crate::error::ApplyError;
use crate::infrastructure::{PageDriver, WaitPolicy};
use crate::models::{load_jobs, save_jobs, BatchReport, JobRecord, PortalKind};
use crate::orchestrator::batch_processor::BatchOrchestrator;
use crate::orchestrator::session_pool::{SessionPool, SessionProvider};
use crate::services::{dedupe, JobDeduplicator, JobScraper, ReportWriter};
use crate::utils::logging;
use crate::workflow::Applicant;

/// 要执行的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// 只抓取岗位
    Scrape,
    /// 只投递已保存的岗位
    Apply,
    /// 先抓取再投递
    Run,
}

impl AppCommand {
    fn label(self) -> &'static str {
        match self {
            AppCommand::Scrape => "抓取岗位",
            AppCommand::Apply => "批量投递",
            AppCommand::Run => "抓取并投递",
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    session: Arc<BrowserSession>,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config, command: AppCommand) -> Result<Self> {
        logging::log_startup(command.label(), &config);

        let session = BrowserSession::start(&config)
            .await
            .context("无法打开浏览器会话")?;

        let cancel = CancellationToken::new();
        install_cancel_triggers(&config, &cancel);

        Ok(Self {
            config,
            session: Arc::new(session),
            cancel,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, command: AppCommand) -> Result<()> {
        if matches!(command, AppCommand::Scrape | AppCommand::Run) {
            let driver = self.session.new_driver().await?;
            scrape_jobs(&driver, &self.config, self.cancel.clone()).await?;
        }

        if matches!(command, AppCommand::Apply | AppCommand::Run) {
            let provider: Arc<dyn SessionProvider> =
                Arc::new(ChromeSessionProvider::new(self.session.clone()));
            let report = apply_jobs(provider, &self.config, self.cancel.clone()).await?;
            logging::print_final_stats(&report, &self.config);
        }

        Ok(())
    }
}

/// 抓取阶段：搜索 → 增量去重 → 保存
///
/// 返回本次新发现的岗位。
pub async fn scrape_jobs(
    driver: &dyn PageDriver,
    config: &Config,
    cancel: CancellationToken,
) -> Result<Vec<JobRecord>> {
    let jobs_file = Path::new(&config.jobs_file);
    let mut saved = if jobs_file.exists() {
        load_jobs(jobs_file).await?
    } else {
        Vec::new()
    };
    let mut dedup = JobDeduplicator::with_known(&saved);

    let scraper = JobScraper::new(
        WaitPolicy::new(config.poll_interval(), cancel),
        config.scrape_scroll_rounds,
        config.scrape_max_pages,
    );
    let found = scraper
        .scrape_all(
            driver,
            &config.portals,
            &config.keywords,
            &config.location,
            &mut dedup,
        )
        .await
        .context("抓取岗位中止")?;

    saved.extend(found.iter().cloned());
    save_jobs(jobs_file, &saved).await?;
    logging::log_scrape_complete(found.len(), saved.len(), &config.jobs_file);

    Ok(found)
}

/// 投递阶段：读取岗位 → 投递 → 写报告
pub async fn apply_jobs(
    provider: Arc<dyn SessionProvider>,
    config: &Config,
    cancel: CancellationToken,
) -> Result<BatchReport> {
    if !Path::new(&config.resume_path).is_file() {
        bail!("简历文件不存在: {}", config.resume_path);
    }

    let jobs = dedupe(load_jobs(Path::new(&config.jobs_file)).await?);
    if jobs.is_empty() {
        warn!("⚠️ 岗位列表为空: {}", config.jobs_file);
        return Ok(BatchReport::new());
    }
    logging::log_jobs_loaded(jobs.len(), &count_by_portal(&jobs));

    let applicant = Arc::new(Applicant {
        resume_path: config.resume_path.clone(),
        contact: config.contact.clone(),
        answers: config.screening.clone(),
    });
    let orchestrator = Arc::new(BatchOrchestrator::from_config(config, cancel));

    let report = if config.max_concurrent_sessions > 1 {
        SessionPool::new(orchestrator, provider, config.max_concurrent_sessions)
            .run(&jobs, applicant)
            .await
    } else {
        info!("➡ 串行模式: 单个浏览器会话");
        match provider.open_session(PortalKind::Unknown).await {
            Ok(driver) => orchestrator.run(driver.as_ref(), &jobs, applicant).await,
            Err(e) => {
                error!("❌ 无法打开投递会话: {:#}", e);
                let mut report = BatchReport::new();
                report.abort(None, ApplyError::SessionLost(format!("{:#}", e)), jobs.len());
                report
            }
        }
    };

    ReportWriter::new(&config.report_file, &config.failed_jobs_file)
        .write(&report)
        .await?;
    Ok(report)
}

fn count_by_portal(jobs: &[JobRecord]) -> Vec<(PortalKind, usize)> {
    let mut counts = std::collections::BTreeMap::new();
    for job in jobs {
        *counts.entry(job.source()).or_insert(0usize) += 1;
    }
    counts.into_iter().collect()
}

/// Ctrl-C 和运行超时都会触发取消
fn install_cancel_triggers(config: &Config, cancel: &CancellationToken) {
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到 Ctrl-C，正在停止...");
            on_ctrl_c.cancel();
        }
    });

    if let Some(timeout) = config.run_timeout() {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!("⏰ 超过运行时限 {:?}，正在停止...", timeout);
            on_timeout.cancel();
        });
    }
}
