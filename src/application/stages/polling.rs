//! Polling - 通用轮询组合子
//!
//! 以固定间隔调用查询函数，直到返回结果或超过截止时间。
//! 单次查询同样受截止时间约束（最多再宽限一个 `interval`），
//! 因此总耗时不超过 `timeout + interval`

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// 轮询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut { waited: Duration, attempts: u32 },
}

/// 轮询直到 `check` 返回 `Ok(Some(_))`
///
/// - `Ok(None)`: 尚未完成，继续等待
/// - `Err(_)`: 立即终止并返回错误
/// - 单次调用越过截止时间: 放弃该次调用，按超时返回
pub async fn poll_until<T, E, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut check: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let budget = deadline.saturating_duration_since(Instant::now()) + interval;
        match tokio::time::timeout(budget, check()).await {
            Ok(result) => {
                if let Some(value) = result? {
                    return Ok(PollOutcome::Ready(value));
                }
            }
            Err(_) => {
                return Ok(PollOutcome::TimedOut {
                    waited: started.elapsed(),
                    attempts,
                });
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(PollOutcome::TimedOut {
                waited: now - started,
                attempts,
            });
        }

        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
