//! 选择器驱动的通用门户适配器
//!
//! 门户页面经常改版，所以每个语义位置都给一组备选选择器，按顺序取第一个命中的。

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ApplyError;
use crate::infrastructure::{DriverResult, ElementRef, PageDriver};
use crate::models::{PortalKind, StepState};
use crate::portals::{AdvanceControl, FlowShape, PortalAdapter, TerminalState};
use crate::services::screening::{Answer, QuestionKind};
use crate::workflow::ApplicationContext;

type Selectors = &'static [&'static str];

/// 一个门户的选择器表
#[derive(Debug, Clone, Copy)]
pub struct PortalSelectors {
    pub kind: PortalKind,
    pub flow: FlowShape,
    /// 申请入口按钮
    pub entry: Selectors,
    /// 申请表单所在的 iframe（点击入口后进入其 src）
    pub frame: Option<&'static str>,
    /// 联系方式步骤的标志元素
    pub contact_step: Selectors,
    pub phone_input: Selectors,
    pub email_input: Selectors,
    /// 简历上传控件（同时作为上传步骤的标志元素）
    pub resume_input: Selectors,
    /// 筛选问题步骤的标志元素
    pub questions_step: Selectors,
    /// 单个问题的容器
    pub question_group: Selectors,
    pub continue_button: Selectors,
    pub submit_button: Selectors,
    /// 提交成功的标志元素
    pub success: Selectors,
    /// 提交成功的提示文字（不区分大小写）
    pub success_texts: Selectors,
    /// 提交成功后地址中包含的片段
    pub success_url_fragments: Selectors,
    /// 提交失败 / 校验错误的标志元素
    pub error: Selectors,
}

/// 问题容器内部的控件
const NUMBER_INPUT: &str = "input[type='number']";
const RADIO_INPUT: &str = "input[type='radio']";
const TEXT_INPUTS: &[&str] = &["textarea", "input[type='text']"];
const QUESTION_LABELS: &[&str] = &["label", "legend", "span"];

/// 选择器驱动的适配器
#[derive(Debug, Clone, Copy)]
pub struct SelectorPortal {
    selectors: PortalSelectors,
}

impl SelectorPortal {
    pub const fn new(selectors: PortalSelectors) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &PortalSelectors {
        &self.selectors
    }

    /// 返回第一个命中的选择器对应的元素
    async fn first_present(
        &self,
        driver: &dyn PageDriver,
        candidates: Selectors,
    ) -> DriverResult<Option<ElementRef>> {
        for selector in candidates {
            if let Some(element) = driver.find_element(selector).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    async fn first_within(
        &self,
        driver: &dyn PageDriver,
        parent: &ElementRef,
        candidates: &[&str],
    ) -> DriverResult<Option<ElementRef>> {
        for selector in candidates {
            if let Some(element) = driver.find_within(parent, selector).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    async fn fill_if_configured(
        &self,
        driver: &dyn PageDriver,
        candidates: Selectors,
        value: Option<&str>,
    ) -> DriverResult<()> {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(());
        };
        if let Some(input) = self.first_present(driver, candidates).await? {
            driver.fill(&input, value).await?;
        }
        Ok(())
    }

    /// 回答单个问题容器
    async fn answer_group(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
        group: &ElementRef,
    ) -> DriverResult<()> {
        let prompt = match self.first_within(driver, group, QUESTION_LABELS).await? {
            Some(label) => driver.text(&label).await?.unwrap_or_default(),
            None => driver.text(group).await?.unwrap_or_default(),
        };

        let (kind, input) = if let Some(input) = driver.find_within(group, NUMBER_INPUT).await? {
            (QuestionKind::Numeric, Some(input))
        } else if driver.find_within(group, RADIO_INPUT).await?.is_some() {
            (QuestionKind::YesNo, None)
        } else if let Some(input) = self.first_within(driver, group, TEXT_INPUTS).await? {
            (QuestionKind::FreeText, Some(input))
        } else {
            debug!("{} 问题没有可识别的输入控件: {}", ctx, prompt.trim());
            return Ok(());
        };

        match (ctx.applicant.answers.answer(&prompt, kind), input) {
            (Answer::Choose(value), _) => {
                let option = format!("input[value='{}']", value);
                if let Some(radio) = driver.find_within(group, &option).await? {
                    driver.click(&radio).await?;
                }
            }
            (Answer::Number(n), Some(input)) => driver.fill(&input, &n.to_string()).await?,
            (Answer::Text(text), Some(input)) => driver.fill(&input, &text).await?,
            _ => {}
        }
        Ok(())
    }

    /// 页面上没有问题容器时，直接按默认规则处理全部控件
    async fn answer_flat(&self, driver: &dyn PageDriver, ctx: &ApplicationContext) -> DriverResult<()> {
        let answers = &ctx.applicant.answers;
        let option = format!("input[value='{}']", answers.yes_no_answer);
        for radio in driver.find_all(&option).await? {
            driver.click(&radio).await?;
        }
        for input in driver.find_all(NUMBER_INPUT).await? {
            driver
                .fill(&input, &answers.years_of_experience.to_string())
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PortalAdapter for SelectorPortal {
    fn kind(&self) -> PortalKind {
        self.selectors.kind
    }

    fn flow(&self) -> FlowShape {
        self.selectors.flow
    }

    async fn locate_entry_control(
        &self,
        driver: &dyn PageDriver,
    ) -> DriverResult<Option<ElementRef>> {
        self.first_present(driver, self.selectors.entry).await
    }

    async fn after_entry(&self, driver: &dyn PageDriver) -> DriverResult<()> {
        let Some(frame_selector) = self.selectors.frame else {
            return Ok(());
        };
        let Some(frame) = driver.find_element(frame_selector).await? else {
            return Ok(());
        };
        if let Some(src) = driver.attribute(&frame, "src").await? {
            info!("📑 申请表单位于 iframe 中，进入: {}", src);
            driver.navigate(&src).await?;
        }
        Ok(())
    }

    async fn locate_step(
        &self,
        driver: &dyn PageDriver,
        step: StepState,
    ) -> DriverResult<Option<ElementRef>> {
        let candidates = match step {
            StepState::NotStarted | StepState::EntryOpened => self.selectors.entry,
            StepState::ContactInfo => self.selectors.contact_step,
            StepState::ResumeUpload => self.selectors.resume_input,
            StepState::ScreeningQuestions => self.selectors.questions_step,
            StepState::Review => self.selectors.submit_button,
            StepState::Submitted | StepState::Failed => return Ok(None),
        };
        self.first_present(driver, candidates).await
    }

    async fn locate_advance_control(
        &self,
        driver: &dyn PageDriver,
    ) -> DriverResult<Option<AdvanceControl>> {
        if let Some(submit) = self.first_present(driver, self.selectors.submit_button).await? {
            return Ok(Some(AdvanceControl::Submit(submit)));
        }
        Ok(self
            .first_present(driver, self.selectors.continue_button)
            .await?
            .map(AdvanceControl::Continue))
    }

    async fn fill_contact_info(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()> {
        let contact = &ctx.applicant.contact;
        self.fill_if_configured(driver, self.selectors.phone_input, contact.phone.as_deref())
            .await?;
        self.fill_if_configured(driver, self.selectors.email_input, contact.email.as_deref())
            .await
    }

    async fn upload_resume(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()> {
        let input = self
            .first_present(driver, self.selectors.resume_input)
            .await?
            .ok_or_else(|| ApplyError::element_not_found(self.selectors.resume_input.join(", ")))?;
        driver.upload_file(&input, ctx.resume_path()).await
    }

    async fn answer_screening_questions(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()> {
        let mut groups = Vec::new();
        for selector in self.selectors.question_group {
            groups = driver.find_all(selector).await?;
            if !groups.is_empty() {
                break;
            }
        }

        if groups.is_empty() {
            return self.answer_flat(driver, ctx).await;
        }

        debug!("{} 共 {} 个筛选问题", ctx, groups.len());
        for group in &groups {
            self.answer_group(driver, ctx, group).await?;
        }
        Ok(())
    }

    async fn confirm_and_submit(
        &self,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
    ) -> DriverResult<()> {
        if let Some(submit) = self.first_present(driver, self.selectors.submit_button).await? {
            return driver.click(&submit).await;
        }
        // 提交按钮已经消失且页面显示成功：不再点击，由调用方判断成功标志是否为新出现
        if self.detect_terminal_state(driver).await? == TerminalState::Submitted {
            debug!("{} 提交按钮已消失，页面显示提交成功", ctx);
            return Ok(());
        }
        Err(ApplyError::element_not_found(self.selectors.submit_button.join(", ")))
    }

    async fn detect_terminal_state(&self, driver: &dyn PageDriver) -> DriverResult<TerminalState> {
        if let Some(error) = self.first_present(driver, self.selectors.error).await? {
            let detail = driver
                .text(&error)
                .await?
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| error.selector().to_string());
            return Ok(TerminalState::Failed(detail));
        }

        if self.first_present(driver, self.selectors.success).await?.is_some() {
            return Ok(TerminalState::Submitted);
        }

        if !self.selectors.success_url_fragments.is_empty() {
            let url = driver.current_url().await?;
            if self
                .selectors
                .success_url_fragments
                .iter()
                .any(|fragment| url.contains(fragment))
            {
                return Ok(TerminalState::Submitted);
            }
        }

        if !self.selectors.success_texts.is_empty() {
            let text = driver.page_text().await?.to_lowercase();
            if self
                .selectors
                .success_texts
                .iter()
                .any(|t| text.contains(&t.to_lowercase()))
            {
                return Ok(TerminalState::Submitted);
            }
        }

        Ok(TerminalState::Pending)
    }
}
