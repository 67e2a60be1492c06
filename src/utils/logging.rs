//! 日志工具模块
//!
//! 进程级日志只初始化一次，同时输出到终端和日志文件；
//! 也可以传入任意 `MakeWriter`（测试中用来捕获日志）。

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{BatchReport, PortalKind};

/// 初始化日志：终端 + 日志文件
///
/// 优先使用 RUST_LOG，否则按 `verbose_logging` 选择 debug / info。
pub fn init(config: &Config) -> Result<()> {
    init_log_file(&config.output_log_file)?;

    let file = OpenOptions::new()
        .append(true)
        .open(&config.output_log_file)
        .with_context(|| format!("打开日志文件失败: {}", config.output_log_file))?;

    init_with_writer(
        std::io::stdout.and(Mutex::new(file)),
        config.verbose_logging,
    )
}

/// 使用指定的输出初始化日志
pub fn init_with_writer<W>(writer: W, verbose: bool) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(if verbose { "debug" } else { "info" }),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("初始化日志失败: {}", e))
}

/// 初始化日志文件（写入表头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n自动投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("写入日志文件失败: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `command`: 本次执行的子命令
/// - `config`: 程序配置
pub fn log_startup(command: &str, config: &Config) {
    let portals: Vec<&str> = config.portals.iter().map(|p| p.name()).collect();
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", command);
    info!("🔎 关键字: {} | 地点: {}", config.keywords, config.location);
    info!("🌐 门户: {}", portals.join(", "));
    info!("⏱ 投递间隔: {} 秒", config.rate_limit_seconds);
    info!("📊 最大并发会话数: {}", config.max_concurrent_sessions);
    info!("{}", "=".repeat(60));
}

/// 记录岗位加载信息
///
/// # 参数
/// - `total`: 岗位总数
/// - `by_portal`: 每个门户的岗位数
pub fn log_jobs_loaded(total: usize, by_portal: &[(PortalKind, usize)]) {
    info!("✓ 找到 {} 个待投递的岗位", total);
    for (portal, count) in by_portal {
        info!("   - {}: {}", portal, count);
    }
}

/// 记录抓取完成信息
pub fn log_scrape_complete(new_jobs: usize, total_saved: usize, jobs_file: &str) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 抓取完成: 新增 {} 个岗位，共 {} 个", new_jobs, total_saved);
    info!("💾 已保存至: {}", jobs_file);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 批次报告
/// - `config`: 程序配置（报告和日志路径）
pub fn print_final_stats(report: &BatchReport, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部投递完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded, report.attempted);
    info!("❌ 失败: {}", report.failed());
    for abort in &report.aborted {
        info!(
            "🛑 中止{}: {} (剩余 {} 个未投递)",
            abort
                .portal
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default(),
            abort.reason,
            abort.remaining
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", config.report_file);
    info!("失败清单: {}", config.failed_jobs_file);
    info!("日志已保存至: {}", config.output_log_file);
}
