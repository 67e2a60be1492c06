pub mod application_ctx;
pub mod application_flow;

pub use application_ctx::{Applicant, ApplicationContext, ContactProfile};
pub use application_flow::ApplicationFlow;
