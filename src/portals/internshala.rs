//! Internshala
//!
//! 单页表单：简历、附加问题和提交按钮在同一页上。

use crate::models::PortalKind;
use crate::portals::{FlowShape, PortalSelectors, SelectorPortal};

pub const SELECTORS: PortalSelectors = PortalSelectors {
    kind: PortalKind::Internshala,
    flow: FlowShape::Linear,
    entry: &["#apply_button", ".btn.btn-large"],
    frame: None,
    contact_step: &[],
    phone_input: &[],
    email_input: &[],
    resume_input: &["input[type='file']"],
    questions_step: &[".additional_question"],
    question_group: &[".additional_question", ".assessment_question"],
    continue_button: &[],
    submit_button: &["#submit_application", "#submit"],
    success: &["#application_submitted"],
    success_texts: &["Application submitted", "applied successfully"],
    success_url_fragments: &[],
    error: &["#error_message", ".error_message"],
};

pub fn adapter() -> SelectorPortal {
    SelectorPortal::new(SELECTORS)
}
