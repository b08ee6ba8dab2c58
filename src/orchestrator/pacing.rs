//! 单词间节流
//!
//! 只有真正访问过网络的单词才需要等待；全部来自缓存时立即处理下一个。

use std::time::Duration;

use tracing::debug;

/// 节流决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// 不等待
    Free,
    /// 处理下一个单词前等待
    Throttle(Duration),
}

/// 节流器
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// 根据单词是否"免费"决定是否等待
    pub fn decide(&self, free: bool) -> Pacing {
        if free || self.interval.is_zero() {
            Pacing::Free
        } else {
            Pacing::Throttle(self.interval)
        }
    }

    /// 执行等待
    pub async fn pause(&self, pacing: Pacing) {
        if let Pacing::Throttle(delay) = pacing {
            debug!("⏳ 等待 {:?} 后继续", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
