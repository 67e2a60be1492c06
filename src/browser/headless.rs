use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use tracing::{debug, error, info};

use crate::browser::connection::spawn_event_loop;
use crate::error::{AppError, AppResult, BrowserError};

/// 无头模式的启动参数
const HEADLESS_ARGS: [&str; 4] = [
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--remote-debugging-port=0",
];

/// 启动无头浏览器
///
/// 无头浏览器没有门户的登录状态，只适合抓取公开的搜索结果。
pub async fn launch_headless_browser(chrome_executable: Option<&str>) -> AppResult<Browser> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder()
        .new_headless_mode()
        .args(HEADLESS_ARGS);
    if let Some(executable) = chrome_executable {
        debug!("浏览器可执行文件: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder.build().map_err(|message| {
        error!("配置无头浏览器失败: {}", message);
        AppError::Browser(BrowserError::ConfigurationFailed { message })
    })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(e),
        })
    })?;
    debug!("无头浏览器启动成功");

    spawn_event_loop(handler).await;
    Ok(browser)
}
