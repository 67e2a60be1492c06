//! # Auto Apply
//!
//! 在多个招聘门户（LinkedIn、Indeed、Internshala、Naukri）上自动搜索并投递岗位
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面驱动能力（导航、查找、点击、输入、上传、读文本）
//! - `ChromePageDriver` - 基于 chromiumoxide 的实现
//! - `WaitPolicy` - 有界轮询，代替固定 sleep
//!
//! ### ② 门户适配层（Portals）
//! - `portals/` - 每个门户的选择器表，由同一个 `SelectorPortal` 解释执行
//! - `PortalAdapter` - 门户差异只体现在这组探测和动作里
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `JobScraper` - 搜索页抓取能力
//! - `JobDeduplicator` - 按指纹去重
//! - `AnswerPolicy` - 筛选问题的默认回答
//! - `ReportWriter` - 写报告能力
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个岗位"的完整投递流程
//! - `ApplicationContext` - 上下文封装（岗位 + 当前步骤 + 尝试次数）
//! - `ApplicationFlow` - 状态机（入口 → 可选步骤 → 确认 → 提交）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 单会话批量投递
//! - `orchestrator/session_pool` - 按门户分组的多会话并行
//! - `orchestrator/app` - 抓取阶段 + 投递阶段
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod portals;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ApplyError, ErrorKind};
pub use infrastructure::{PageDriver, WaitPolicy};
pub use models::{ApplicationOutcome, BatchReport, JobRecord, PortalKind, StepState};
pub use orchestrator::{App, AppCommand, BatchOrchestrator};
pub use portals::{AdapterRegistry, PortalAdapter};
pub use workflow::{Applicant, ApplicationContext, ApplicationFlow};
