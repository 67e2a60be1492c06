use std::time::Duration;

use chromiumoxide::handler::Handler;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, BrowserError};

/// 连接调试端口的尝试次数（浏览器刚启动时端口可能还没有监听）
const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// 事件循环启动后等待浏览器状态同步
const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// 连接到已经打开调试端口的浏览器（通常已登录各个门户）
pub async fn connect_to_browser(port: u16) -> AppResult<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("🔌 正在连接到浏览器: {}", browser_url);

    let mut attempt = 1;
    let (browser, handler) = loop {
        match Browser::connect(&browser_url).await {
            Ok(connected) => break connected,
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(
                    "连接浏览器失败 (第 {}/{} 次): {}，{:?} 后重试",
                    attempt, CONNECT_ATTEMPTS, e, CONNECT_RETRY_DELAY
                );
                attempt += 1;
                sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(e) => {
                error!("连接浏览器失败: {}", e);
                return Err(AppError::browser_connection_failed(port, e));
            }
        }
    };
    debug!("浏览器连接成功 (第 {} 次尝试)", attempt);

    spawn_event_loop(handler).await;
    Ok(browser)
}

/// 在后台驱动浏览器事件；事件流结束意味着连接已断开
pub(crate) async fn spawn_event_loop(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("浏览器事件循环结束: {}", e);
                return;
            }
        }
        debug!("浏览器事件流已关闭");
    });

    sleep(SETTLE_DELAY).await;
}

/// 新建一个空白页面（每个页面驱动独占一个标签页）
pub async fn open_blank_page(browser: &Browser) -> AppResult<Page> {
    debug!("创建空白页面");
    browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })
}
