//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量投递和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 抓取阶段 / 投递阶段
//! - 持有浏览器会话和取消信号
//!
//! ### `batch_processor` - 单会话批量投递
//! - 按顺序投递一组岗位（Vec<JobRecord>）
//! - 选择门户适配器、隔离单个岗位的失败
//! - 会话断开 / 取消时中止剩余岗位
//!
//! ### `session_pool` - 多会话并行
//! - 按门户分组，每组一个独立会话
//! - 控制并发数量（Semaphore）
//!
//! ### `rate_limiter` - 投递间隔
//! - 所有会话共享
//!
//! ## 层次关系
//!
//! ```text
//! app (抓取 + 投递)
//!     ↓
//! session_pool (按门户分组并行，可选)
//!     ↓
//! batch_processor (处理 Vec<JobRecord>)
//!     ↓
//! workflow::ApplicationFlow (处理单个岗位)
//!     ↓
//! portals (门户适配：选择器表)
//!     ↓
//! infrastructure (基础设施：PageDriver / WaitPolicy)
//! ```

pub mod app;
pub mod batch_processor;
pub mod rate_limiter;
pub mod session_pool;

// 重新导出主要类型
pub use app::{apply_jobs, scrape_jobs, App, AppCommand};
pub use batch_processor::BatchOrchestrator;
pub use rate_limiter::RateLimiter;
pub use session_pool::{SessionPool, SessionProvider};
