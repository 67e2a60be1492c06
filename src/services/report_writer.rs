//! 报告写入服务 - 业务能力层
//!
//! 只负责"写报告"能力：批次报告写成 JSON，失败岗位追加到纯文本清单，便于手动补投。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::models::{ApplicationOutcome, BatchReport};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportFile<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a BatchReport,
}

/// 报告写入服务
pub struct ReportWriter {
    report_path: PathBuf,
    failed_path: PathBuf,
}

impl ReportWriter {
    /// 创建新的报告写入服务
    pub fn new(report_path: impl Into<PathBuf>, failed_path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: report_path.into(),
            failed_path: failed_path.into(),
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// 写入批次报告（覆盖）并追加失败清单
    pub async fn write(&self, report: &BatchReport) -> Result<()> {
        self.write_report(report).await?;
        self.append_failed(&report.per_job_outcomes).await?;
        Ok(())
    }

    pub async fn write_report(&self, report: &BatchReport) -> Result<()> {
        if let Some(parent) = self.report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("创建目录失败: {}", parent.display()))?;
        }

        let file = ReportFile {
            generated_at: Local::now().to_rfc3339(),
            report,
        };
        let json = serde_json::to_string_pretty(&file).context("序列化批次报告失败")?;
        tokio::fs::write(&self.report_path, json)
            .await
            .with_context(|| format!("写入报告失败: {}", self.report_path.display()))?;

        info!("💾 批次报告已保存: {}", self.report_path.display());
        Ok(())
    }

    /// 把失败的岗位追加到清单
    pub async fn append_failed(&self, outcomes: &[ApplicationOutcome]) -> Result<()> {
        let failed: Vec<&ApplicationOutcome> = outcomes.iter().filter(|o| !o.succeeded).collect();
        if failed.is_empty() {
            return Ok(());
        }

        debug!("写入失败清单: {} 个岗位", failed.len());

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut lines = String::new();
        for outcome in failed {
            let reason = outcome
                .failure_reason
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            lines.push_str(&format!(
                "{} | {} | {} | {} | {}\n",
                timestamp,
                outcome.job.source(),
                outcome.job,
                reason,
                outcome.job.url()
            ));
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failed_path)
            .await
            .with_context(|| format!("打开失败清单失败: {}", self.failed_path.display()))?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
