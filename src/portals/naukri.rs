//! Naukri
//!
//! 筛选问题以聊天机器人的形式出现，每条回答后点击发送。

use crate::models::PortalKind;
use crate::portals::{FlowShape, PortalSelectors, SelectorPortal};

pub const SELECTORS: PortalSelectors = PortalSelectors {
    kind: PortalKind::Naukri,
    flow: FlowShape::Linear,
    entry: &[".apply-button", "#apply-button"],
    frame: None,
    contact_step: &[],
    phone_input: &[],
    email_input: &[],
    resume_input: &["input[type='file']"],
    questions_step: &[".chatbot_ListItem", ".chatbot_DrawerContentWrapper"],
    question_group: &[".chatbot_ListItem"],
    continue_button: &[".sendMsg"],
    submit_button: &[".submit-button", ".sendMsgbtn_container .sendMsg[type='submit']"],
    success: &[".apply-message"],
    success_texts: &["successfully applied", "applied to"],
    success_url_fragments: &["myapply"],
    error: &[".error-message"],
};

pub fn adapter() -> SelectorPortal {
    SelectorPortal::new(SELECTORS)
}
