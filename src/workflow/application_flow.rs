//! 投递流程 - 流程层
//!
//! 核心职责：把"一个岗位"从打开页面驱动到 Submitted 或 Failed
//!
//! 流程顺序：
//! 1. 打开岗位页 → 等待申请入口 → 点击
//! 2. 依次探测可选步骤（联系方式 → 简历 → 筛选问题），不存在就跳过
//! 3. 确认页：定长门户直接等提交按钮，变长门户在有限次数内点"继续"
//! 4. 提交 → 等待门户给出明确结果

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, StepTimeouts};
use crate::error::ApplyError;
use crate::infrastructure::{PageDriver, WaitPolicy};
use crate::models::{ApplicationOutcome, StepState};
use crate::portals::{AdvanceControl, FlowShape, PortalAdapter, TerminalState};
use crate::workflow::application_ctx::ApplicationContext;

/// 投递流程
///
/// - 流程只写一份，门户差异全部通过 `PortalAdapter` 表达
/// - 不持有任何资源（page），驱动由调用方传入
/// - 每次探测都经过 `WaitPolicy`，不使用固定 sleep
pub struct ApplicationFlow {
    wait: WaitPolicy,
    timeouts: StepTimeouts,
    max_step_advance_iterations: usize,
}

impl ApplicationFlow {
    /// 创建新的投递流程
    pub fn new(wait: WaitPolicy, timeouts: StepTimeouts, max_step_advance_iterations: usize) -> Self {
        Self {
            wait,
            timeouts,
            max_step_advance_iterations: max_step_advance_iterations.max(1),
        }
    }

    pub fn from_config(config: &Config, wait: WaitPolicy) -> Self {
        Self::new(
            wait,
            config.step_timeout_seconds,
            config.max_step_advance_iterations,
        )
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait
    }

    /// 驱动一次投递直到终止状态
    ///
    /// 总是返回一个结果。`SessionLost` / `Cancelled` 同样以失败结果返回，
    /// 由编排层根据 `ApplyError::is_batch_fatal` 决定是否中止批次。
    pub async fn run(
        &self,
        adapter: &dyn PortalAdapter,
        driver: &dyn PageDriver,
        mut ctx: ApplicationContext,
    ) -> ApplicationOutcome {
        info!("{} 📝 开始投递: {}", ctx, ctx.job);

        match self.drive(adapter, driver, &mut ctx).await {
            Ok(()) => {
                ctx.transition(StepState::Submitted);
                info!("{} ✅ 投递成功", ctx);
                ApplicationOutcome::submitted(ctx.job, ctx.elapsed_steps)
            }
            Err(err) => {
                ctx.last_error = Some(err.kind());
                let failed_at = ctx.current_state;
                ctx.transition(StepState::Failed);
                warn!("{} ❌ 在「{}」失败: {}", ctx, failed_at.label(), err);
                ApplicationOutcome::failed(ctx.job, err, ctx.elapsed_steps)
            }
        }
    }

    async fn drive(
        &self,
        adapter: &dyn PortalAdapter,
        driver: &dyn PageDriver,
        ctx: &mut ApplicationContext,
    ) -> Result<(), ApplyError> {
        // ========== 1. 申请入口 ==========
        adapter.open(driver, &ctx.job).await?;

        let entry = self
            .wait
            .poll(self.timeouts.for_step(StepState::EntryOpened), || {
                adapter.locate_entry_control(driver)
            })
            .await?
            .ok_or_else(|| ApplyError::element_not_found(format!("{} 申请入口", adapter.kind())))?;

        ctx.record_attempt(StepState::EntryOpened);
        driver.click(&entry).await?;
        adapter.after_entry(driver).await?;
        ctx.transition(StepState::EntryOpened);
        debug!("{} ✓ 已打开申请表单", ctx);

        // ========== 2. 可选步骤 ==========
        for step in StepState::OPTIONAL_STEPS {
            let timeout = self.timeouts.for_step(step);

            let marker = self
                .wait
                .poll(timeout, || adapter.locate_step(driver, step))
                .await?;
            if marker.is_none() {
                debug!("{} ⏭ 门户没有「{}」步骤，跳过", ctx, step.label());
                continue;
            }

            ctx.transition(step);
            ctx.record_attempt(step);
            self.perform_step(adapter, driver, ctx, step).await?;

            match self.probe_advance(adapter, driver, timeout).await? {
                Some(AdvanceControl::Continue(button)) => driver.click(&button).await?,
                // 提交按钮留给确认阶段
                Some(AdvanceControl::Submit(_)) => {}
                None => return Err(ApplyError::StepAdvanceTimeout { step }),
            }
            debug!("{} ✓ 「{}」完成", ctx, step.label());
        }

        // ========== 3. 确认页 ==========
        ctx.transition(StepState::Review);
        match adapter.flow() {
            FlowShape::Linear => self.await_submit_control(adapter, driver, ctx).await?,
            FlowShape::VariableLength => self.advance_loop(adapter, driver, ctx).await?,
        }

        // ========== 4. 提交并确认 ==========
        ctx.record_attempt(StepState::Submitted);
        // 提交前已经存在的成功标志不能算作门户的确认
        let marked_before = adapter.detect_terminal_state(driver).await? == TerminalState::Submitted;
        if marked_before {
            warn!("{} ⚠️ 提交前页面已有成功标志，只认提交后新出现的确认", ctx);
        }
        adapter.confirm_and_submit(driver, ctx).await?;
        info!("{} 📤 已点击提交，等待门户确认...", ctx);

        let terminal = self
            .wait
            .poll(self.timeouts.submit(), || async move {
                adapter
                    .detect_terminal_state(driver)
                    .await
                    .map(|state| match state {
                        TerminalState::Pending => None,
                        TerminalState::Submitted if marked_before => None,
                        state => Some(state),
                    })
            })
            .await?;

        match terminal {
            Some(TerminalState::Submitted) => Ok(()),
            Some(TerminalState::Failed(detail)) => Err(ApplyError::SubmissionRejected { detail }),
            Some(TerminalState::Pending) | None => Err(ApplyError::TerminalStateAmbiguous),
        }
    }

    async fn perform_step(
        &self,
        adapter: &dyn PortalAdapter,
        driver: &dyn PageDriver,
        ctx: &ApplicationContext,
        step: StepState,
    ) -> Result<(), ApplyError> {
        match step {
            StepState::ContactInfo => adapter.fill_contact_info(driver, ctx).await,
            StepState::ResumeUpload => {
                info!("{} 📎 上传简历: {}", ctx, ctx.resume_path());
                adapter.upload_resume(driver, ctx).await
            }
            StepState::ScreeningQuestions => adapter.answer_screening_questions(driver, ctx).await,
            _ => Ok(()),
        }
    }

    async fn probe_advance(
        &self,
        adapter: &dyn PortalAdapter,
        driver: &dyn PageDriver,
        timeout: Duration,
    ) -> Result<Option<AdvanceControl>, ApplyError> {
        self.wait
            .poll(timeout, || adapter.locate_advance_control(driver))
            .await
    }

    /// 定长门户：确认页上必须出现提交按钮
    async fn await_submit_control(
        &self,
        adapter: &dyn PortalAdapter,
        driver: &dyn PageDriver,
        ctx: &mut ApplicationContext,
    ) -> Result<(), ApplyError> {
        ctx.record_attempt(StepState::Review);
        let submit = self
            .wait
            .poll(self.timeouts.for_step(StepState::Review), || async move {
                adapter
                    .locate_advance_control(driver)
                    .await
                    .map(|control| match control {
                        Some(AdvanceControl::Submit(button)) => Some(button),
                        _ => None,
                    })
            })
            .await?;

        match submit {
            Some(_) => Ok(()),
            None => Err(ApplyError::StepAdvanceTimeout {
                step: StepState::Review,
            }),
        }
    }

    /// 变长门户：有限次数地点击"继续"，直到出现提交按钮
    ///
    /// 中间页面如果还有筛选问题就先回答（回答动作是幂等的）。
    async fn advance_loop(
        &self,
        adapter: &dyn PortalAdapter,
        driver: &dyn PageDriver,
        ctx: &mut ApplicationContext,
    ) -> Result<(), ApplyError> {
        let timeout = self.timeouts.for_step(StepState::Review);

        for iteration in 1..=self.max_step_advance_iterations {
            ctx.record_attempt(StepState::Review);

            match self.probe_advance(adapter, driver, timeout).await? {
                Some(AdvanceControl::Submit(_)) => {
                    debug!("{} ✓ 第 {} 轮出现提交按钮", ctx, iteration);
                    return Ok(());
                }
                Some(AdvanceControl::Continue(button)) => {
                    if adapter
                        .locate_step(driver, StepState::ScreeningQuestions)
                        .await?
                        .is_some()
                    {
                        adapter.answer_screening_questions(driver, ctx).await?;
                    }
                    debug!("{} ➡ 第 {} 轮点击继续", ctx, iteration);
                    driver.click(&button).await?;
                }
                None => return Err(ApplyError::NoAdvanceControlFound { iterations: iteration }),
            }
        }

        Err(ApplyError::NoAdvanceControlFound {
            iterations: self.max_step_advance_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::ErrorKind;
    use crate::infrastructure::testing::{DriverCall, FakePage, Mutation};
    use crate::infrastructure::ElementRef;
    use crate::models::{JobRecord, PortalKind};
    use crate::portals::{PortalSelectors, SelectorPortal};
    use crate::workflow::Applicant;

    const JOB_URL: &str = "https://www.linkedin.com/jobs/view/1";

    fn portal(flow: FlowShape) -> SelectorPortal {
        SelectorPortal::new(PortalSelectors {
            kind: PortalKind::LinkedIn,
            flow,
            entry: &["#apply"],
            frame: None,
            contact_step: &["#phone"],
            phone_input: &["#phone"],
            email_input: &[],
            resume_input: &["#resume"],
            questions_step: &["#questions"],
            question_group: &[".question"],
            continue_button: &["#next"],
            submit_button: &["#submit"],
            success: &["#done"],
            success_texts: &[],
            success_url_fragments: &[],
            error: &["#error"],
        })
    }

    fn flow(max_iterations: usize) -> ApplicationFlow {
        ApplicationFlow::new(WaitPolicy::default(), StepTimeouts::default(), max_iterations)
    }

    fn ctx() -> ApplicationContext {
        let job = JobRecord::new("Rust Engineer", "Acme", "Remote", JOB_URL);
        let applicant = Applicant {
            resume_path: "/tmp/resume.pdf".into(),
            ..Applicant::default()
        };
        ApplicationContext::new(job, 1, Arc::new(applicant))
    }

    #[tokio::test(start_paused = true)]
    async fn no_optional_steps_goes_straight_to_review() {
        let page = FakePage::new();
        page.show("#apply")
            .on_click("#apply", vec![Mutation::Show("#submit".into())])
            .on_click("#submit", vec![Mutation::Show("#done".into())]);

        let outcome = flow(10)
            .run(&portal(FlowShape::VariableLength), &page, ctx())
            .await;

        assert!(outcome.succeeded);
        assert_eq!(
            outcome.elapsed_steps,
            vec![
                StepState::NotStarted,
                StepState::EntryOpened,
                StepState::Review,
                StepState::Submitted
            ]
        );
        assert!(!page
            .calls()
            .iter()
            .any(|c| matches!(c, DriverCall::Fill(..) | DriverCall::Upload(..))));
        assert_eq!(page.clicks("#submit"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_entry_fails_without_clicking() {
        let page = FakePage::new();

        let outcome = flow(10).run(&portal(FlowShape::Linear), &page, ctx()).await;

        assert_eq!(outcome.failure_kind(), Some(ErrorKind::ElementNotFound));
        assert_eq!(
            outcome.elapsed_steps,
            vec![StepState::NotStarted, StepState::Failed]
        );
        assert!(!page.calls().iter().any(|c| matches!(c, DriverCall::Click(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn step_without_advance_control_times_out() {
        let page = FakePage::new();
        page.show("#apply")
            .on_click("#apply", vec![Mutation::Show("#phone".into())]);

        let outcome = flow(10).run(&portal(FlowShape::Linear), &page, ctx()).await;

        assert_eq!(
            outcome.failure_reason,
            Some(ApplyError::StepAdvanceTimeout {
                step: StepState::ContactInfo
            })
        );
        assert_eq!(outcome.final_step(), StepState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn continue_loop_is_bounded() {
        let page = FakePage::new();
        page.show("#apply")
            .on_click("#apply", vec![Mutation::Show("#next".into())]);

        let outcome = flow(3)
            .run(&portal(FlowShape::VariableLength), &page, ctx())
            .await;

        assert_eq!(
            outcome.failure_reason,
            Some(ApplyError::NoAdvanceControlFound { iterations: 3 })
        );
        assert_eq!(page.clicks("#next"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn error_banner_after_submit_is_rejection() {
        let page = FakePage::new();
        page.show("#apply")
            .on_click("#apply", vec![Mutation::Show("#submit".into())])
            .on_click("#submit", vec![Mutation::Show("#error".into())])
            .set_text(&ElementRef::new("#error", 0), "Please answer all questions");

        let outcome = flow(10).run(&portal(FlowShape::Linear), &page, ctx()).await;

        assert_eq!(
            outcome.failure_reason,
            Some(ApplyError::SubmissionRejected {
                detail: "Please answer all questions".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn entry_that_appears_late_is_still_found() {
        let page = FakePage::new();
        page.show_after("#apply", Duration::from_secs(3))
            .on_click("#apply", vec![Mutation::Show("#submit".into())])
            .on_click("#submit", vec![Mutation::Show("#done".into())]);

        let outcome = flow(10).run(&portal(FlowShape::Linear), &page, ctx()).await;

        assert!(outcome.succeeded, "{:?}", outcome.failure_reason);
    }
}
