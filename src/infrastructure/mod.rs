//! 基础设施层：持有稀缺资源（Page），只暴露能力

pub mod chrome_driver;
pub mod js_executor;
pub mod page_driver;
pub mod testing;
pub mod wait_policy;

pub use chrome_driver::ChromePageDriver;
pub use js_executor::JsExecutor;
pub use page_driver::{DriverResult, ElementRef, PageDriver};
pub use wait_policy::WaitPolicy;
