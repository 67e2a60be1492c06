mod common;

use std::sync::Arc;

use auto_apply::error::{ApplyError, ErrorKind};
use auto_apply::infrastructure::testing::{DriverCall, FakePage, Mutation};
use auto_apply::infrastructure::{ElementRef, WaitPolicy};
use auto_apply::models::StepState;
use auto_apply::portals::{indeed, internshala, linkedin, naukri};
use auto_apply::workflow::{Applicant, ApplicationContext};

use common::{ctx, flow, indeed_job, job, linkedin_job, PHONE, RESUME};

const LI_PHONE: &str = "input[id*='phoneNumber-nationalNumber']";
const LI_CONTINUE: &str = "button[aria-label='Continue to next step']";
const LI_REVIEW: &str = "button[aria-label='Review your application']";
const LI_SUBMIT: &str = "button[aria-label='Submit application']";
const LI_GROUP: &str = ".jobs-easy-apply-form-section__grouping";
const FILE_INPUT: &str = "input[type='file']";

#[tokio::test(start_paused = true)]
async fn linkedin_easy_apply_walks_every_step() {
    let page = FakePage::new();
    let group0 = ElementRef::new(LI_GROUP, 0);
    let group1 = ElementRef::new(LI_GROUP, 1);

    page.show(".jobs-apply-button")
        .on_click(
            ".jobs-apply-button",
            vec![Mutation::Show(LI_PHONE.into()), Mutation::Show(LI_CONTINUE.into())],
        )
        .on_clicks(
            LI_CONTINUE,
            vec![
                vec![Mutation::Hide(LI_PHONE.into()), Mutation::Show(FILE_INPUT.into())],
                vec![
                    Mutation::Hide(FILE_INPUT.into()),
                    Mutation::ShowMany(LI_GROUP.into(), 2),
                ],
                vec![
                    Mutation::Hide(LI_GROUP.into()),
                    Mutation::Hide(LI_CONTINUE.into()),
                    Mutation::Show(LI_REVIEW.into()),
                ],
            ],
        )
        .on_click(
            LI_REVIEW,
            vec![Mutation::Hide(LI_REVIEW.into()), Mutation::Show(LI_SUBMIT.into())],
        )
        .on_click(
            LI_SUBMIT,
            vec![Mutation::Show(".artdeco-inline-feedback--success".into())],
        );

    // 数值题 + 是/否题
    page.add_children(&group0, "label", 1)
        .set_text(&group0.child("label", 0), "How many years of Rust experience do you have?")
        .add_children(&group0, "input[type='number']", 1)
        .add_children(&group1, "label", 1)
        .set_text(&group1.child("label", 0), "Are you willing to relocate?")
        .add_children(&group1, "input[type='radio']", 1)
        .add_children(&group1, "input[value='Yes']", 1);

    let outcome = flow(WaitPolicy::default())
        .run(&linkedin::adapter(), &page, ctx(linkedin_job(1)))
        .await;

    assert!(outcome.succeeded, "{:?}", outcome.failure_reason);
    assert_eq!(
        outcome.elapsed_steps,
        vec![
            StepState::NotStarted,
            StepState::EntryOpened,
            StepState::ContactInfo,
            StepState::ResumeUpload,
            StepState::ScreeningQuestions,
            StepState::Review,
            StepState::Submitted,
        ]
    );
    assert_eq!(page.filled(&ElementRef::new(LI_PHONE, 0)).as_deref(), Some(PHONE));
    assert_eq!(
        page.filled(&group0.child("input[type='number']", 0)).as_deref(),
        Some("1")
    );
    assert_eq!(page.clicks("input[value='Yes']"), 1);
    assert!(page
        .calls()
        .contains(&DriverCall::Upload(FILE_INPUT.into(), RESUME.into())));
    assert_eq!(page.clicks(LI_SUBMIT), 1);
}

#[tokio::test(start_paused = true)]
async fn indeed_follows_the_application_iframe() {
    let page = FakePage::new();
    let iframe = ElementRef::new("#indeedapply-iframe", 0);
    let form_url = "https://apply.indeed.com/indeedapply/form?jk=9";

    page.show(".jobsearch-IndeedApplyButton-newDesign")
        .on_click(
            ".jobsearch-IndeedApplyButton-newDesign",
            vec![Mutation::Show("#indeedapply-iframe".into())],
        )
        .set_attribute(&iframe, "src", form_url)
        .on_navigate(
            form_url,
            vec![
                Mutation::Hide("#indeedapply-iframe".into()),
                Mutation::Show(FILE_INPUT.into()),
                Mutation::Show("button[data-testid='continue-button']".into()),
            ],
        )
        .on_click(
            "button[data-testid='continue-button']",
            vec![
                Mutation::Hide(FILE_INPUT.into()),
                Mutation::Hide("button[data-testid='continue-button']".into()),
                Mutation::Show("button[data-testid='submit-button']".into()),
            ],
        )
        .on_click(
            "button[data-testid='submit-button']",
            vec![Mutation::SetUrl("https://apply.indeed.com/indeedapply/post-apply".into())],
        );

    let job = indeed_job(9);
    let outcome = flow(WaitPolicy::default())
        .run(&indeed::adapter(), &page, ctx(job.clone()))
        .await;

    assert!(outcome.succeeded, "{:?}", outcome.failure_reason);
    assert_eq!(page.navigations(), vec![job.url().to_string(), form_url.to_string()]);
    assert_eq!(
        outcome.elapsed_steps,
        vec![
            StepState::NotStarted,
            StepState::EntryOpened,
            StepState::ResumeUpload,
            StepState::Review,
            StepState::Submitted,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn internshala_single_page_form_with_free_text_override() {
    let page = FakePage::new();
    let question = ElementRef::new(".additional_question", 0);

    page.show("#apply_button")
        .on_click(
            "#apply_button",
            vec![
                Mutation::Show(FILE_INPUT.into()),
                Mutation::Show(".additional_question".into()),
                Mutation::Show("#submit_application".into()),
            ],
        )
        .on_click(
            "#submit_application",
            vec![Mutation::SetBody("Application submitted successfully!".into())],
        )
        .add_children(&question, "label", 1)
        .set_text(&question.child("label", 0), "Why should you be hired for this role?")
        .add_children(&question, "textarea", 1);

    let mut applicant = Applicant {
        resume_path: RESUME.into(),
        ..Applicant::default()
    };
    applicant
        .answers
        .overrides
        .insert("be hired".into(), "I ship reliable Rust services.".into());
    let ctx = ApplicationContext::new(
        job("Backend Intern", "https://internshala.com/job/detail/backend-intern-123"),
        1,
        Arc::new(applicant),
    );

    let outcome = flow(WaitPolicy::default())
        .run(&internshala::adapter(), &page, ctx)
        .await;

    assert!(outcome.succeeded, "{:?}", outcome.failure_reason);
    assert_eq!(
        page.filled(&question.child("textarea", 0)).as_deref(),
        Some("I ship reliable Rust services.")
    );
    // 单页表单上只点一次提交
    assert_eq!(page.clicks("#submit_application"), 1);
    assert_eq!(
        outcome.elapsed_steps,
        vec![
            StepState::NotStarted,
            StepState::EntryOpened,
            StepState::ResumeUpload,
            StepState::ScreeningQuestions,
            StepState::Review,
            StepState::Submitted,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn resume_upload_failure_fails_with_element_not_found() {
    let page = FakePage::new();
    page.show(".apply-button")
        .on_click(".apply-button", vec![Mutation::Show(FILE_INPUT.into())])
        .fail_action(FILE_INPUT, ApplyError::element_not_found(FILE_INPUT));

    let outcome = flow(WaitPolicy::default())
        .run(
            &naukri::adapter(),
            &page,
            ctx(job("SDE", "https://www.naukri.com/job-listings-sde-42")),
        )
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.failure_kind(), Some(ErrorKind::ElementNotFound));
    assert_eq!(
        outcome.elapsed_steps,
        vec![
            StepState::NotStarted,
            StepState::EntryOpened,
            StepState::ResumeUpload,
            StepState::Failed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn pending_after_submit_is_ambiguous() {
    let page = FakePage::new();
    page.show(".apply-button")
        .on_click(".apply-button", vec![Mutation::Show(".submit-button".into())]);

    let outcome = flow(WaitPolicy::default())
        .run(
            &naukri::adapter(),
            &page,
            ctx(job("SDE", "https://www.naukri.com/job-listings-sde-43")),
        )
        .await;

    assert_eq!(outcome.failure_reason, Some(ApplyError::TerminalStateAmbiguous));
    assert_eq!(page.clicks(".submit-button"), 1);
    let steps = &outcome.elapsed_steps;
    assert_eq!(&steps[steps.len() - 2..], &[StepState::Review, StepState::Failed]);
}

#[tokio::test(start_paused = true)]
async fn lost_session_is_reported_as_session_lost() {
    let page = FakePage::new();
    page.show(".jobs-apply-button").on_click(
        ".jobs-apply-button",
        vec![Mutation::KillSession("websocket closed".into())],
    );

    let outcome = flow(WaitPolicy::default())
        .run(&linkedin::adapter(), &page, ctx(linkedin_job(2)))
        .await;

    assert_eq!(outcome.failure_kind(), Some(ErrorKind::SessionLost));
    assert!(outcome.failure_reason.as_ref().is_some_and(ApplyError::is_batch_fatal));
}

#[tokio::test(start_paused = true)]
async fn steps_never_move_backwards() {
    let page = FakePage::new();
    page.show(".jobs-apply-button")
        .on_click(".jobs-apply-button", vec![Mutation::Show(LI_CONTINUE.into())])
        .show(LI_GROUP);

    // 继续按钮永远存在：在有限次数后失败，并且步骤只向前
    let outcome = flow(WaitPolicy::default())
        .run(&linkedin::adapter(), &page, ctx(linkedin_job(3)))
        .await;

    assert_eq!(outcome.failure_kind(), Some(ErrorKind::NoAdvanceControlFound));
    let steps = &outcome.elapsed_steps;
    for pair in steps.windows(2) {
        assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
    }
    assert_eq!(steps.iter().filter(|s| s.is_terminal()).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn success_marker_shown_before_submit_is_not_confirmation() {
    let page = FakePage::new();
    page.show(".jobs-apply-button").on_click(
        ".jobs-apply-button",
        vec![
            Mutation::Show(LI_SUBMIT.into()),
            Mutation::Show(".artdeco-inline-feedback--success".into()),
        ],
    );

    let outcome = flow(WaitPolicy::default())
        .run(&linkedin::adapter(), &page, ctx(linkedin_job(4)))
        .await;

    // 提交按钮照样点击，但旧的成功标志不算门户确认
    assert_eq!(page.clicks(LI_SUBMIT), 1);
    assert!(!outcome.succeeded);
    assert_eq!(outcome.failure_reason, Some(ApplyError::TerminalStateAmbiguous));
}
