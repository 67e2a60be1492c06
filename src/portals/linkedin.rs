//! LinkedIn Easy Apply

use crate::models::PortalKind;
use crate::portals::{FlowShape, PortalSelectors, SelectorPortal};

pub const SELECTORS: PortalSelectors = PortalSelectors {
    kind: PortalKind::LinkedIn,
    flow: FlowShape::VariableLength,
    entry: &[".jobs-apply-button", "button[aria-label^='Easy Apply']"],
    frame: None,
    contact_step: &[
        "input[id*='phoneNumber-nationalNumber']",
        ".jobs-easy-apply-form-section__grouping input[type='email']",
    ],
    phone_input: &["input[id*='phoneNumber-nationalNumber']"],
    email_input: &["select[id*='emailAddress']", "input[type='email']"],
    resume_input: &["input[type='file']"],
    questions_step: &[".jobs-easy-apply-form-section__grouping"],
    question_group: &[".jobs-easy-apply-form-section__grouping"],
    continue_button: &[
        "button[aria-label='Continue to next step']",
        "button[aria-label='Review your application']",
    ],
    submit_button: &["button[aria-label='Submit application']"],
    success: &[".artdeco-inline-feedback--success", "#post-apply-modal"],
    success_texts: &["Your application was sent"],
    success_url_fragments: &[],
    error: &[".artdeco-inline-feedback--error"],
};

pub fn adapter() -> SelectorPortal {
    SelectorPortal::new(SELECTORS)
}
