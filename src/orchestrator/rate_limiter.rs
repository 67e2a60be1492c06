//! 投递间隔控制 - 编排层
//!
//! 所有会话共享同一个限速器：上一次投递结束后至少间隔 `interval` 才开始下一次。
//! 这是并行模式下唯一跨会话共享的状态，用互斥锁保护。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::ApplyError;
use crate::infrastructure::WaitPolicy;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_finished: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 等到允许开始下一次投递
    ///
    /// 持锁等待，其他会话会排在后面；取消信号触发时返回 `Cancelled`。
    pub async fn acquire(&self, wait: &WaitPolicy) -> Result<(), ApplyError> {
        if wait.is_cancelled() {
            return Err(ApplyError::Cancelled);
        }

        let last = self.last_finished.lock().await;
        if let Some(finished) = *last {
            let ready_at = finished + self.interval;
            let now = Instant::now();
            if ready_at > now {
                debug!("⏳ 等待 {:?} 后开始下一次投递", ready_at - now);
                wait.pause(ready_at - now).await?;
            }
        }
        Ok(())
    }

    /// 记录一次投递结束
    pub async fn finish(&self) {
        *self.last_finished.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire(&WaitPolicy::default()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_out_the_remaining_interval() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let wait = WaitPolicy::default();

        limiter.finish().await;
        tokio::time::advance(Duration::from_secs(2)).await;

        let start = Instant::now();
        limiter.acquire(&wait).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_pause() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let wait = WaitPolicy::new(Duration::from_millis(500), cancel.clone());

        limiter.finish().await;
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });

        assert_eq!(limiter.acquire(&wait).await, Err(ApplyError::Cancelled));
        canceller.await.unwrap();
    }
}
