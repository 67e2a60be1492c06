use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use auto_apply::config::Config;
use auto_apply::orchestrator::{App, AppCommand};
use auto_apply::utils::logging;

#[derive(Parser)]
#[command(name = "auto_apply")]
#[command(about = "Search job portals and submit applications automatically")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (.json or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Job listing file, overrides `jobs_file`
    #[arg(long, global = true)]
    jobs: Option<String>,

    /// Batch report file, overrides `report_file`
    #[arg(long, global = true)]
    report: Option<String>,

    /// Resume to upload, overrides `resume_path`
    #[arg(long, global = true)]
    resume: Option<String>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Scrape job listings into the job file
    Scrape,
    /// Apply to every job in the job file
    Apply,
    /// Scrape, then apply
    Run,
}

impl From<Command> for AppCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Scrape => AppCommand::Scrape,
            Command::Apply => AppCommand::Apply,
            Command::Run => AppCommand::Run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(jobs) = cli.jobs {
        config.jobs_file = jobs;
    }
    if let Some(report) = cli.report {
        config.report_file = report;
    }
    if let Some(resume) = cli.resume {
        config.resume_path = resume;
    }

    // 初始化日志
    logging::init(&config)?;

    // 初始化并运行应用
    let command = AppCommand::from(cli.command);
    App::initialize(config, command).await?.run(command).await?;

    Ok(())
}
