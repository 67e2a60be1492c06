//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源；页面级脚本（滚动、读全文）都经过这里，
//! CDP 错误在这一层被归类为"会话断开"或"脚本失败"。

use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::ApplyError;
use crate::infrastructure::page_driver::DriverResult;

/// 滚动到底部并返回滚动后的页面高度
const SCROLL_TO_BOTTOM: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return document.body.scrollHeight; })()";

const BODY_TEXT: &str = "document.body ? document.body.innerText : ''";

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 执行页面级脚本，结果统一为 `DriverResult`
/// - 不认识岗位 / 门户
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并反序列化结果
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: &str) -> DriverResult<T> {
        let result = self.page.evaluate(js_code).await.map_err(script_error)?;
        result
            .into_value()
            .map_err(|e| ApplyError::Internal(format!("脚本结果无法解析: {}", e)))
    }

    pub async fn eval(&self, js_code: &str) -> DriverResult<JsonValue> {
        self.eval_as(js_code).await
    }

    /// 滚动到页面底部（触发懒加载列表），返回页面高度
    pub async fn scroll_to_bottom(&self) -> DriverResult<u64> {
        self.eval_as(SCROLL_TO_BOTTOM).await
    }

    /// 页面可见文本
    pub async fn body_text(&self) -> DriverResult<String> {
        self.eval_as(BODY_TEXT).await
    }
}

/// CDP 连接层面的错误（websocket 断开、通道关闭、无响应）
pub(crate) fn is_session_error(err: &CdpError) -> bool {
    matches!(
        err,
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse
    )
}

pub(crate) fn session_lost(err: CdpError) -> ApplyError {
    ApplyError::SessionLost(err.to_string())
}

fn script_error(err: CdpError) -> ApplyError {
    if is_session_error(&err) {
        session_lost(err)
    } else {
        ApplyError::Internal(format!("执行脚本失败: {}", err))
    }
}
