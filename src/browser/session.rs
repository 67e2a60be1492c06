//! 浏览器会话
//!
//! 持有 `Browser`，为抓取和投递提供页面驱动。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser::{connect_to_browser, launch_headless_browser, open_blank_page};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromePageDriver, PageDriver};
use crate::models::PortalKind;
use crate::orchestrator::SessionProvider;

/// 浏览器会话（唯一持有 Browser 的结构）
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// 优先连接调试端口上的浏览器；失败且允许无头模式时启动无头浏览器
    pub async fn start(config: &Config) -> AppResult<Self> {
        match connect_to_browser(config.browser_debug_port).await {
            Ok(browser) => Ok(Self { browser }),
            Err(e) if config.headless => {
                warn!("⚠️ {}，改为启动无头浏览器", e);
                let browser = launch_headless_browser(config.chrome_executable.as_deref()).await?;
                Ok(Self { browser })
            }
            Err(e) => Err(e),
        }
    }

    /// 新建一个页面驱动（每个驱动对应一个独立的标签页）
    pub async fn new_driver(&self) -> AppResult<ChromePageDriver> {
        let page = open_blank_page(&self.browser).await?;
        Ok(ChromePageDriver::new(page))
    }
}

/// 从同一个浏览器为每个门户打开独立的标签页
pub struct ChromeSessionProvider {
    session: Arc<BrowserSession>,
}

impl ChromeSessionProvider {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    async fn open_session(&self, portal: PortalKind) -> Result<Arc<dyn PageDriver>> {
        let driver = self.session.new_driver().await?;
        info!("[{}] 🆕 已打开新标签页", portal);
        Ok(Arc::new(driver))
    }
}
