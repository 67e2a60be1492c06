//! Indeed Apply
//!
//! 申请表单在 iframe 里，点击入口按钮后直接打开 iframe 的地址。

use crate::models::PortalKind;
use crate::portals::{FlowShape, PortalSelectors, SelectorPortal};

pub const SELECTORS: PortalSelectors = PortalSelectors {
    kind: PortalKind::Indeed,
    flow: FlowShape::VariableLength,
    entry: &[".jobsearch-IndeedApplyButton-newDesign", "#indeedApplyButton"],
    frame: Some("#indeedapply-iframe"),
    contact_step: &["input[name='phoneNumber']", "input[name='email']"],
    phone_input: &["input[name='phoneNumber']"],
    email_input: &["input[name='email']"],
    resume_input: &["input[type='file']"],
    questions_step: &[".ia-Questions-item"],
    question_group: &[".ia-Questions-item"],
    continue_button: &["button[data-testid='continue-button']", ".ia-continueButton"],
    submit_button: &["button[data-testid='submit-button']"],
    success: &[".ia-PostApply-header"],
    success_texts: &["Your application has been submitted"],
    success_url_fragments: &["post-apply"],
    error: &[".ia-ErrorMessage"],
};

pub fn adapter() -> SelectorPortal {
    SelectorPortal::new(SELECTORS)
}
