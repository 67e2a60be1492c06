//! 页面驱动能力 - 基础设施层
//!
//! 流程核心只依赖这组能力，不依赖具体的浏览器自动化库。
//! 一个驱动实例对应一个页面会话，所有操作必须串行执行。

use std::fmt;

use async_trait::async_trait;

use crate::error::ApplyError;

/// 驱动操作结果
///
/// 错误只有两类：`ElementNotFound`（元素已失效）和 `SessionLost`（会话断开）。
pub type DriverResult<T> = Result<T, ApplyError>;

/// 页面元素引用
///
/// 以 (选择器, 下标) 路径描述，每次操作时由驱动重新解析，
/// 因此不会持有已经从 DOM 上脱落的节点。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    path: Vec<(String, usize)>,
}

impl ElementRef {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            path: vec![(selector.into(), index)],
        }
    }

    /// 在当前元素内部的子元素
    pub fn child(&self, selector: impl Into<String>, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push((selector.into(), index));
        Self { path }
    }

    pub fn path(&self) -> &[(String, usize)] {
        &self.path
    }

    /// 最后一级选择器
    pub fn selector(&self) -> &str {
        self.path.last().map(|(s, _)| s.as_str()).unwrap_or_default()
    }

    pub fn index(&self) -> usize {
        self.path.last().map(|(_, i)| *i).unwrap_or_default()
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .path
            .iter()
            .map(|(selector, index)| format!("{}[{}]", selector, index))
            .collect();
        f.write_str(&parts.join(" > "))
    }
}

/// 页面驱动
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// 查找第一个匹配的元素，不存在返回 None
    async fn find_element(&self, selector: &str) -> DriverResult<Option<ElementRef>>;

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<ElementRef>>;

    /// 在父元素内部查找第一个匹配的元素
    async fn find_within(
        &self,
        parent: &ElementRef,
        selector: &str,
    ) -> DriverResult<Option<ElementRef>>;

    async fn click(&self, element: &ElementRef) -> DriverResult<()>;

    /// 清空后输入文本（重复调用结果相同）
    async fn fill(&self, element: &ElementRef, text: &str) -> DriverResult<()>;

    async fn upload_file(&self, element: &ElementRef, path: &str) -> DriverResult<()>;

    async fn text(&self, element: &ElementRef) -> DriverResult<Option<String>>;

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>>;

    async fn current_url(&self) -> DriverResult<String>;

    /// 整个页面的可见文本
    async fn page_text(&self) -> DriverResult<String>;

    async fn scroll_to_bottom(&self) -> DriverResult<()>;
}
