//! 门户适配层
//!
//! 每个门户用不同的页面结构暴露同样的语义步骤（打开申请、填写联系方式、
//! 上传简历、回答筛选问题、提交）。流程只写一份（`workflow::ApplicationFlow`），
//! 门户之间的差异全部收敛到 `PortalAdapter` 的几个探测和动作里。
//!
//! 四个内置门户都由选择器表描述，交给同一个 `SelectorPortal` 解释执行。

pub mod indeed;
pub mod internshala;
pub mod linkedin;
pub mod naukri;
pub mod selector_portal;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::infrastructure::{DriverResult, ElementRef, PageDriver};
use crate::models::{JobRecord, PortalKind, StepState};
use crate::workflow::ApplicationContext;

pub use selector_portal::{PortalSelectors, SelectorPortal};

/// 提交后的页面状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    /// 门户确认已收到申请
    Submitted,
    /// 门户显示错误（附带页面上的提示文字）
    Failed(String),
    /// 仍在流程中，无法判断
    Pending,
}

/// 流程形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowShape {
    /// 步骤固定，确认页直接出现提交按钮
    Linear,
    /// 提交前有数量不定的"继续"页面
    VariableLength,
}

/// 推进流程的按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceControl {
    Continue(ElementRef),
    Submit(ElementRef),
}

/// 门户适配器
///
/// 动作方法在同一页面状态下重复调用必须是幂等的：
/// 探测失败后重试不能导致重复填写或重复提交。
#[async_trait]
pub trait PortalAdapter: Send + Sync {
    fn kind(&self) -> PortalKind;

    fn flow(&self) -> FlowShape;

    /// 打开岗位详情页
    async fn open(&self, driver: &dyn PageDriver, job: &JobRecord) -> DriverResult<()> {
        driver.navigate(job.url()).await
    }

    /// 初始的"申请"按钮
    async fn locate_entry_control(&self, driver: &dyn PageDriver)
        -> DriverResult<Option<ElementRef>>;

    /// 点击申请按钮之后的额外处理（例如进入 iframe 中的表单）
    async fn after_entry(&self, _driver: &dyn PageDriver) -> DriverResult<()> {
        Ok(())
    }

    /// 探测当前页面是否包含某个步骤，门户跳过该步骤时返回 None
    async fn locate_step(
        &self,
        driver: &dyn PageDriver,
        step: StepState,
    ) -> DriverResult<Option<ElementRef>>;

    /// 探测继续 / 提交按钮（提交按钮优先）
    async fn locate_advance_control(
        &self,
        driver: &dyn PageDriver,
    ) -> DriverResult<Option<AdvanceControl>>;

    async fn fill_contact_info(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()>;

    async fn upload_resume(&self, driver: &dyn PageDriver, ctx: &ApplicationContext)
        -> DriverResult<()>;

    async fn answer_screening_questions(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()>;

    async fn confirm_and_submit(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()>;

    async fn detect_terminal_state(&self, driver: &dyn PageDriver) -> DriverResult<TerminalState>;
}

/// 门户 → 适配器
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<PortalKind, Arc<dyn PortalAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置门户
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(linkedin::adapter()));
        registry.register(Arc::new(indeed::adapter()));
        registry.register(Arc::new(internshala::adapter()));
        registry.register(Arc::new(naukri::adapter()));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn PortalAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: PortalKind) -> Option<Arc<dyn PortalAdapter>> {
        if kind == PortalKind::Unknown {
            return None;
        }
        self.adapters.get(&kind).cloned()
    }

    pub fn supports(&self, kind: PortalKind) -> bool {
        self.get(kind).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_supported_portal() {
        let registry = AdapterRegistry::with_defaults();
        for kind in PortalKind::SUPPORTED {
            let adapter = registry.get(kind).expect("已注册");
            assert_eq!(adapter.kind(), kind);
        }
        assert!(!registry.supports(PortalKind::Unknown));
    }

    #[test]
    fn flow_shapes() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(
            registry.get(PortalKind::Indeed).unwrap().flow(),
            FlowShape::VariableLength
        );
        assert_eq!(
            registry.get(PortalKind::Naukri).unwrap().flow(),
            FlowShape::Linear
        );
    }
}
