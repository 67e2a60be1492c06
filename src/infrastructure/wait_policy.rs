//! 有界轮询 - 基础设施层
//!
//! 代替固定 sleep：按间隔重复探测，直到拿到结果或超过期限。
//! 超时是正常结果（返回 false / None），不是错误。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::ApplyError;

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 有界轮询策略
///
/// 超时时间由每次调用传入（入口按钮短、提交确认长），
/// 这里只保存轮询间隔和取消信号。
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl WaitPolicy {
    pub fn new(poll_interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            poll_interval,
            cancel,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 轮询 `probe` 直到返回 Some 或超时
    ///
    /// - 至少探测一次（即使 timeout 为 0）
    /// - 探测返回错误时立即上抛（通常是会话断开）
    /// - 取消信号触发时返回 `ApplyError::Cancelled`
    pub async fn poll<T, F, Fut>(&self, timeout: Duration, mut probe: F) -> Result<Option<T>, ApplyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, ApplyError>>,
    {
        let deadline = Instant::now() + timeout;
        let mut attempts = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ApplyError::Cancelled);
            }

            attempts += 1;
            if let Some(found) = probe().await? {
                return Ok(Some(found));
            }

            let now = Instant::now();
            if now >= deadline {
                trace!("轮询超时: {:?} 内探测 {} 次", timeout, attempts);
                return Ok(None);
            }

            let wait = self.poll_interval.min(deadline - now);
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ApplyError::Cancelled),
                _ = sleep(wait) => {}
            }
        }
    }

    /// 布尔版本：条件在超时前成立返回 true，超时返回 false
    ///
    /// 条件本身不会失败；取消时同样返回 false。
    pub async fn wait<F, Fut>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let result = self
            .poll(timeout, || {
                let fut = predicate();
                async move { Ok(fut.await.then_some(())) }
            })
            .await;
        matches!(result, Ok(Some(())))
    }

    /// 可取消的暂停
    pub async fn pause(&self, duration: Duration) -> Result<(), ApplyError> {
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ApplyError::Cancelled),
            _ = sleep(duration) => Ok(()),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, CancellationToken::new())
    }
}
