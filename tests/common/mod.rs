#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use auto_apply::config::StepTimeouts;
use auto_apply::infrastructure::testing::{FakePage, Mutation};
use auto_apply::infrastructure::{DriverResult, ElementRef, PageDriver, WaitPolicy};
use auto_apply::models::{JobRecord, PortalKind, StepState};
use auto_apply::orchestrator::SessionProvider;
use auto_apply::portals::{
    AdvanceControl, AdapterRegistry, FlowShape, PortalAdapter, PortalSelectors, SelectorPortal,
    TerminalState,
};
use auto_apply::workflow::{Applicant, ApplicationContext, ApplicationFlow, ContactProfile};
use auto_apply::BatchOrchestrator;

pub const RESUME: &str = "/home/me/resume.pdf";
pub const PHONE: &str = "9876543210";

/// 最简单的门户：入口 → 提交 → 成功标志
pub fn simple_portal(kind: PortalKind) -> SelectorPortal {
    SelectorPortal::new(PortalSelectors {
        kind,
        flow: FlowShape::Linear,
        entry: &["#apply"],
        frame: None,
        contact_step: &[],
        phone_input: &[],
        email_input: &[],
        resume_input: &["#resume"],
        questions_step: &[],
        question_group: &[],
        continue_button: &[],
        submit_button: &["#submit"],
        success: &["#done"],
        success_texts: &[],
        success_url_fragments: &[],
        error: &["#error"],
    })
}

pub fn simple_registry(kinds: &[PortalKind]) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for &kind in kinds {
        registry.register(Arc::new(simple_portal(kind)));
    }
    registry
}

/// 为 `simple_portal` 准备页面：打开岗位页出现入口，点击入口出现提交按钮，提交后出现成功标志
pub fn script_success(page: &FakePage, url: &str) {
    page.on_navigate(
        url,
        vec![
            Mutation::Hide("#done".into()),
            Mutation::Hide("#submit".into()),
            Mutation::Show("#apply".into()),
        ],
    );
    page.on_click("#apply", vec![Mutation::Show("#submit".into())]);
    page.on_click("#submit", vec![Mutation::Show("#done".into())]);
}

/// 打开岗位页时页面上什么都没有
pub fn script_empty(page: &FakePage, url: &str) {
    page.on_navigate(
        url,
        vec![
            Mutation::Hide("#apply".into()),
            Mutation::Hide("#submit".into()),
            Mutation::Hide("#done".into()),
        ],
    );
}

pub fn applicant() -> Arc<Applicant> {
    Arc::new(Applicant {
        resume_path: RESUME.into(),
        contact: ContactProfile {
            phone: Some(PHONE.into()),
            email: None,
        },
        ..Applicant::default()
    })
}

pub fn job(title: &str, url: &str) -> JobRecord {
    JobRecord::new(title, "Acme", "Bengaluru", url)
}

pub fn linkedin_job(n: usize) -> JobRecord {
    job(
        &format!("Engineer {}", n),
        &format!("https://www.linkedin.com/jobs/view/{}", n),
    )
}

pub fn indeed_job(n: usize) -> JobRecord {
    job(
        &format!("Developer {}", n),
        &format!("https://www.indeed.com/viewjob?jk={}", n),
    )
}

pub fn flow(wait: WaitPolicy) -> ApplicationFlow {
    ApplicationFlow::new(wait, StepTimeouts::default(), 10)
}

pub fn orchestrator(registry: AdapterRegistry, wait: WaitPolicy) -> BatchOrchestrator {
    BatchOrchestrator::new(registry, flow(wait), Duration::from_secs(5))
}

pub fn ctx(job: JobRecord) -> ApplicationContext {
    ApplicationContext::new(job, 1, applicant())
}

/// 入口探测时 panic 的适配器
pub struct PanickingAdapter {
    pub kind: PortalKind,
}

#[async_trait]
impl PortalAdapter for PanickingAdapter {
    fn kind(&self) -> PortalKind {
        self.kind
    }

    fn flow(&self) -> FlowShape {
        FlowShape::Linear
    }

    async fn locate_entry_control(&self, _driver: &dyn PageDriver) -> DriverResult<Option<ElementRef>> {
        panic!("selector table corrupted");
    }

    async fn locate_step(
        &self,
        _driver: &dyn PageDriver,
        _step: StepState,
    ) -> DriverResult<Option<ElementRef>> {
        Ok(None)
    }

    async fn locate_advance_control(
        &self,
        _driver: &dyn PageDriver,
    ) -> DriverResult<Option<AdvanceControl>> {
        Ok(None)
    }

    async fn fill_contact_info(&self, _driver: &dyn PageDriver, _ctx: &ApplicationContext) -> DriverResult<()> {
        Ok(())
    }

    async fn upload_resume(&self, _driver: &dyn PageDriver, _ctx: &ApplicationContext) -> DriverResult<()> {
        Ok(())
    }

    async fn answer_screening_questions(
        &self,
        _driver: &dyn PageDriver,
        _ctx: &ApplicationContext,
    ) -> DriverResult<()> {
        Ok(())
    }

    async fn confirm_and_submit(&self, _driver: &dyn PageDriver, _ctx: &ApplicationContext) -> DriverResult<()> {
        Ok(())
    }

    async fn detect_terminal_state(&self, _driver: &dyn PageDriver) -> DriverResult<TerminalState> {
        Ok(TerminalState::Pending)
    }
}

/// 每个门户一个预先准备好的假页面
#[derive(Default)]
pub struct FakeSessions {
    pages: HashMap<PortalKind, Arc<FakePage>>,
}

impl FakeSessions {
    pub fn with_page(mut self, portal: PortalKind, page: Arc<FakePage>) -> Self {
        self.pages.insert(portal, page);
        self
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn open_session(&self, portal: PortalKind) -> Result<Arc<dyn PageDriver>> {
        match self.pages.get(&portal) {
            Some(page) => Ok(page.clone() as Arc<dyn PageDriver>),
            None => Err(anyhow!("{} 未登录", portal)),
        }
    }
}
