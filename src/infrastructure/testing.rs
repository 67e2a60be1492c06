//! 内存中的假页面驱动
//!
//! 用脚本描述"点击某个按钮后页面变成什么样"，
//! 让状态机、适配器和批次编排可以在没有浏览器的情况下测试。
//! 元素可以延迟出现（配合 tokio 暂停时钟使用）。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::ApplyError;
use crate::infrastructure::page_driver::{DriverResult, ElementRef, PageDriver};

/// 页面变化
#[derive(Debug, Clone)]
pub enum Mutation {
    /// 出现一个元素
    Show(String),
    /// 出现 n 个同选择器元素
    ShowMany(String, usize),
    /// 延迟一段时间后出现
    ShowAfter(String, Duration),
    Hide(String),
    SetUrl(String),
    SetBody(String),
    SetText(ElementRef, String),
    SetAttribute(ElementRef, String, String),
    /// 之后的所有调用都返回 SessionLost
    KillSession(String),
}

/// 驱动调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Navigate(String),
    Find(String),
    Click(String),
    Fill(String, String),
    Upload(String, String),
    Read(String),
    CurrentUrl,
    PageText,
    Scroll,
}

#[derive(Debug, Default)]
struct Presence {
    count: usize,
    visible_at: Option<Instant>,
}

#[derive(Default)]
struct FakeState {
    url: String,
    body: String,
    /// (父元素, 选择器) → 存在情况，顶层父元素为 None
    elements: HashMap<(Option<ElementRef>, String), Presence>,
    texts: HashMap<ElementRef, String>,
    attributes: HashMap<(ElementRef, String), String>,
    /// 第 n 次点击应用第 n 组变化，超出后重复最后一组
    on_click: HashMap<String, Vec<Vec<Mutation>>>,
    click_counts: HashMap<String, usize>,
    on_navigate: HashMap<String, Vec<Mutation>>,
    on_scroll: Vec<Vec<Mutation>>,
    failures: HashMap<String, ApplyError>,
    filled: HashMap<String, String>,
    session_lost: Option<String>,
    calls: Vec<DriverCall>,
}

impl FakeState {
    fn apply(&mut self, mutations: &[Mutation]) {
        for mutation in mutations {
            match mutation {
                Mutation::Show(selector) => self.set_count(selector, 1, None),
                Mutation::ShowMany(selector, n) => self.set_count(selector, *n, None),
                Mutation::ShowAfter(selector, delay) => {
                    self.set_count(selector, 1, Some(Instant::now() + *delay))
                }
                Mutation::Hide(selector) => {
                    self.elements.remove(&(None, selector.clone()));
                }
                Mutation::SetUrl(url) => self.url = url.clone(),
                Mutation::SetBody(body) => self.body = body.clone(),
                Mutation::SetText(element, text) => {
                    self.texts.insert(element.clone(), text.clone());
                }
                Mutation::SetAttribute(element, name, value) => {
                    self.attributes
                        .insert((element.clone(), name.clone()), value.clone());
                }
                Mutation::KillSession(reason) => self.session_lost = Some(reason.clone()),
            }
        }
    }

    fn set_count(&mut self, selector: &str, count: usize, visible_at: Option<Instant>) {
        self.elements.insert(
            (None, selector.to_string()),
            Presence { count, visible_at },
        );
    }

    fn count(&self, parent: Option<&ElementRef>, selector: &str) -> usize {
        match self.elements.get(&(parent.cloned(), selector.to_string())) {
            Some(presence) => match presence.visible_at {
                Some(at) if Instant::now() < at => 0,
                _ => presence.count,
            },
            None => 0,
        }
    }

    fn exists(&self, element: &ElementRef) -> bool {
        let path = element.path();
        let mut parent: Option<ElementRef> = None;
        for (selector, index) in path {
            if *index >= self.count(parent.as_ref(), selector) {
                return false;
            }
            parent = Some(match parent {
                None => ElementRef::new(selector.clone(), *index),
                Some(p) => p.child(selector.clone(), *index),
            });
        }
        true
    }

    fn check_session(&self) -> DriverResult<()> {
        match &self.session_lost {
            Some(reason) => Err(ApplyError::SessionLost(reason.clone())),
            None => Ok(()),
        }
    }

    fn check_action(&self, element: &ElementRef) -> DriverResult<()> {
        self.check_session()?;
        if let Some(err) = self.failures.get(element.selector()) {
            return Err(err.clone());
        }
        if !self.exists(element) {
            return Err(ApplyError::element_not_found(element.to_string()));
        }
        Ok(())
    }
}

/// 假页面
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn show(&self, selector: &str) -> &Self {
        self.lock().apply(&[Mutation::Show(selector.to_string())]);
        self
    }

    pub fn show_many(&self, selector: &str, n: usize) -> &Self {
        self.lock().apply(&[Mutation::ShowMany(selector.to_string(), n)]);
        self
    }

    pub fn show_after(&self, selector: &str, delay: Duration) -> &Self {
        self.lock()
            .apply(&[Mutation::ShowAfter(selector.to_string(), delay)]);
        self
    }

    pub fn hide(&self, selector: &str) -> &Self {
        self.lock().apply(&[Mutation::Hide(selector.to_string())]);
        self
    }

    pub fn set_body(&self, body: &str) -> &Self {
        self.lock().apply(&[Mutation::SetBody(body.to_string())]);
        self
    }

    /// 在父元素下添加 n 个子元素
    pub fn add_children(&self, parent: &ElementRef, selector: &str, n: usize) -> &Self {
        self.lock().elements.insert(
            (Some(parent.clone()), selector.to_string()),
            Presence {
                count: n,
                visible_at: None,
            },
        );
        self
    }

    pub fn set_text(&self, element: &ElementRef, text: &str) -> &Self {
        self.lock().texts.insert(element.clone(), text.to_string());
        self
    }

    pub fn set_attribute(&self, element: &ElementRef, name: &str, value: &str) -> &Self {
        self.lock()
            .attributes
            .insert((element.clone(), name.to_string()), value.to_string());
        self
    }

    /// 每次点击匹配选择器的元素后都应用这些变化
    pub fn on_click(&self, selector: &str, mutations: Vec<Mutation>) -> &Self {
        self.on_clicks(selector, vec![mutations])
    }

    /// 依次为每次点击准备的变化（用完后重复最后一组）
    pub fn on_clicks(&self, selector: &str, rounds: Vec<Vec<Mutation>>) -> &Self {
        self.lock().on_click.insert(selector.to_string(), rounds);
        self
    }

    /// 导航到该地址后应用这些变化
    pub fn on_navigate(&self, url: &str, mutations: Vec<Mutation>) -> &Self {
        self.lock()
            .on_navigate
            .insert(url.to_string(), mutations);
        self
    }

    /// 依次为每次滚动准备的变化
    pub fn on_scroll(&self, rounds: Vec<Vec<Mutation>>) -> &Self {
        self.lock().on_scroll = rounds;
        self
    }

    /// 对该选择器元素的动作（点击 / 输入 / 上传）返回指定错误
    pub fn fail_action(&self, selector: &str, err: ApplyError) -> &Self {
        self.lock().failures.insert(selector.to_string(), err);
        self
    }

    pub fn kill_session(&self, reason: &str) {
        self.lock()
            .apply(&[Mutation::KillSession(reason.to_string())]);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    pub fn clicks(&self, selector: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, DriverCall::Click(s) if s == selector))
            .count()
    }

    /// 最后一次输入到该元素的值
    pub fn filled(&self, element: &ElementRef) -> Option<String> {
        self.lock().filled.get(&element.to_string()).cloned()
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::Navigate(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Navigate(url.to_string()));
        state.url = url.to_string();
        if let Some(mutations) = state.on_navigate.get(url).cloned() {
            state.apply(&mutations);
        }
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> DriverResult<Option<ElementRef>> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Find(selector.to_string()));
        Ok((state.count(None, selector) > 0).then(|| ElementRef::new(selector, 0)))
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<ElementRef>> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Find(selector.to_string()));
        let count = state.count(None, selector);
        Ok((0..count).map(|i| ElementRef::new(selector, i)).collect())
    }

    async fn find_within(
        &self,
        parent: &ElementRef,
        selector: &str,
    ) -> DriverResult<Option<ElementRef>> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Find(format!("{} {}", parent, selector)));
        if !state.exists(parent) {
            return Ok(None);
        }
        Ok((state.count(Some(parent), selector) > 0).then(|| parent.child(selector, 0)))
    }

    async fn click(&self, element: &ElementRef) -> DriverResult<()> {
        let mut state = self.lock();
        state.check_action(element)?;
        state
            .calls
            .push(DriverCall::Click(element.selector().to_string()));
        let selector = element.selector().to_string();
        let nth = {
            let count = state.click_counts.entry(selector.clone()).or_insert(0);
            *count += 1;
            *count - 1
        };
        let mutations = state
            .on_click
            .get(&selector)
            .and_then(|rounds| rounds.get(nth).or_else(|| rounds.last()))
            .cloned();
        if let Some(mutations) = mutations {
            state.apply(&mutations);
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.check_action(element)?;
        state.calls.push(DriverCall::Fill(
            element.selector().to_string(),
            text.to_string(),
        ));
        state.filled.insert(element.to_string(), text.to_string());
        Ok(())
    }

    async fn upload_file(&self, element: &ElementRef, path: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.check_action(element)?;
        state.calls.push(DriverCall::Upload(
            element.selector().to_string(),
            path.to_string(),
        ));
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> DriverResult<Option<String>> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Read(element.to_string()));
        if !state.exists(element) {
            return Ok(None);
        }
        Ok(state.texts.get(element).cloned())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Read(format!("{}@{}", element, name)));
        if !state.exists(element) {
            return Ok(None);
        }
        Ok(state
            .attributes
            .get(&(element.clone(), name.to_string()))
            .cloned())
    }

    async fn current_url(&self) -> DriverResult<String> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::CurrentUrl);
        Ok(state.url.clone())
    }

    async fn page_text(&self) -> DriverResult<String> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::PageText);
        Ok(state.body.clone())
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        let mut state = self.lock();
        state.check_session()?;
        state.calls.push(DriverCall::Scroll);
        if !state.on_scroll.is_empty() {
            let round = state.on_scroll.remove(0);
            state.apply(&round);
        }
        Ok(())
    }
}
