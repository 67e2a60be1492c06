pub mod connection;
pub mod headless;
pub mod session;

pub use connection::{connect_to_browser, open_blank_page};
pub use headless::launch_headless_browser;
pub use session::{BrowserSession, ChromeSessionProvider};
