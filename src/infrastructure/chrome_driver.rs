//! 基于 chromiumoxide 的页面驱动
//!
//! 元素引用每次操作时重新解析；CDP 连接层面的错误统一视为会话断开。

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use tracing::debug;

use crate::error::ApplyError;
use crate::infrastructure::page_driver::{DriverResult, ElementRef, PageDriver};
use crate::infrastructure::js_executor::{is_session_error, session_lost, JsExecutor};

/// Chrome 页面驱动
pub struct ChromePageDriver {
    executor: JsExecutor,
}

impl ChromePageDriver {
    pub fn new(page: Page) -> Self {
        Self {
            executor: JsExecutor::new(page),
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    /// 按路径解析元素
    async fn resolve(&self, element: &ElementRef) -> DriverResult<Option<Element>> {
        let mut current: Option<Element> = None;

        for (selector, index) in element.path() {
            let candidates = match &current {
                None => self.executor.page().find_elements(selector.as_str()).await,
                Some(parent) => parent.find_elements(selector.as_str()).await,
            };
            let candidates = match candidates {
                Ok(found) => found,
                Err(e) if is_session_error(&e) => return Err(session_lost(e)),
                Err(e) => {
                    debug!("查找元素 {} 失败: {}", selector, e);
                    return Ok(None);
                }
            };
            match candidates.into_iter().nth(*index) {
                Some(found) => current = Some(found),
                None => return Ok(None),
            }
        }

        Ok(current)
    }

    /// 解析元素，不存在时报 ElementNotFound
    async fn require(&self, element: &ElementRef) -> DriverResult<Element> {
        self.resolve(element)
            .await?
            .ok_or_else(|| ApplyError::element_not_found(element.to_string()))
    }

    async fn count(&self, parent: Option<&ElementRef>, selector: &str) -> DriverResult<usize> {
        let found = match parent {
            None => self.executor.page().find_elements(selector).await,
            Some(parent) => match self.resolve(parent).await? {
                Some(el) => el.find_elements(selector).await,
                None => return Ok(0),
            },
        };
        match found {
            Ok(elements) => Ok(elements.len()),
            Err(e) if is_session_error(&e) => Err(session_lost(e)),
            Err(e) => {
                debug!("查找元素 {} 失败: {}", selector, e);
                Ok(0)
            }
        }
    }
}

/// 元素动作失败：会话错误原样上抛，其余视为元素失效
fn action_error(element: &ElementRef, err: CdpError) -> ApplyError {
    if is_session_error(&err) {
        session_lost(err)
    } else {
        debug!("元素 {} 操作失败: {}", element, err);
        ApplyError::element_not_found(element.to_string())
    }
}

#[async_trait]
impl PageDriver for ChromePageDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("导航到: {}", url);
        match self.executor.page().goto(url).await {
            Ok(_) => Ok(()),
            Err(e) if is_session_error(&e) => Err(session_lost(e)),
            Err(e) => Err(ApplyError::Internal(format!("导航到 {} 失败: {}", url, e))),
        }
    }

    async fn find_element(&self, selector: &str) -> DriverResult<Option<ElementRef>> {
        let count = self.count(None, selector).await?;
        Ok((count > 0).then(|| ElementRef::new(selector, 0)))
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<ElementRef>> {
        let count = self.count(None, selector).await?;
        Ok((0..count).map(|i| ElementRef::new(selector, i)).collect())
    }

    async fn find_within(
        &self,
        parent: &ElementRef,
        selector: &str,
    ) -> DriverResult<Option<ElementRef>> {
        let count = self.count(Some(parent), selector).await?;
        Ok((count > 0).then(|| parent.child(selector, 0)))
    }

    async fn click(&self, element: &ElementRef) -> DriverResult<()> {
        let el = self.require(element).await?;
        el.click().await.map_err(|e| action_error(element, e))?;
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> DriverResult<()> {
        let el = self.require(element).await?;
        el.call_js_fn(
            "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
            false,
        )
        .await
        .map_err(|e| action_error(element, e))?;
        el.click().await.map_err(|e| action_error(element, e))?;
        el.type_str(text)
            .await
            .map_err(|e| action_error(element, e))?;
        Ok(())
    }

    async fn upload_file(&self, element: &ElementRef, path: &str) -> DriverResult<()> {
        let el = self.require(element).await?;
        let params = SetFileInputFilesParams {
            files: vec![path.to_string()],
            node_id: None,
            backend_node_id: Some(el.backend_node_id),
            object_id: None,
        };
        self.executor
            .page()
            .execute(params)
            .await
            .map_err(|e| action_error(element, e))?;
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> DriverResult<Option<String>> {
        match self.resolve(element).await? {
            Some(el) => el.inner_text().await.map_err(|e| action_error(element, e)),
            None => Ok(None),
        }
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        match self.resolve(element).await? {
            Some(el) => el
                .attribute(name)
                .await
                .map_err(|e| action_error(element, e)),
            None => Ok(None),
        }
    }

    async fn current_url(&self) -> DriverResult<String> {
        match self.executor.page().url().await {
            Ok(url) => Ok(url.unwrap_or_default()),
            Err(e) if is_session_error(&e) => Err(session_lost(e)),
            Err(e) => Err(ApplyError::Internal(format!("读取当前地址失败: {}", e))),
        }
    }

    async fn page_text(&self) -> DriverResult<String> {
        self.executor.body_text().await
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        let height = self.executor.scroll_to_bottom().await?;
        debug!("滚动到底部，页面高度 {}", height);
        Ok(())
    }
}
