//! 有界重试组合子
//!
//! 网关、代码生成、静态验证与试运行共用：`attempts()` 给出有限次尝试序列，
//! `pause()` 按退避策略等待；`run()` 是无状态操作的便捷封装。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// 两次尝试之间的等待策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// 不等待
    None,
    /// 固定间隔
    Fixed(Duration),
    /// 第 k 次失败后等待 base * 2^k
    Exponential { base: Duration },
}

impl Backoff {
    pub fn delay_after(&self, failed_attempt: usize) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Exponential { base } => {
                let exp = failed_attempt.min(16) as u32;
                base.saturating_mul(2u32.saturating_pow(exp))
            }
        }
    }
}

/// 单次尝试（序号从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub number: usize,
    pub max: usize,
}

impl Attempt {
    pub fn is_last(&self) -> bool {
        self.number >= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Backoff,
}

/// run() 的失败结果
#[derive(Debug)]
pub enum RetryError<E> {
    /// 不可重试的错误，立即返回
    Fatal(E),
    /// 尝试次数耗尽
    Exhausted { attempts: usize, last: E },
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// 供应商调用：60 * 2^k 秒
    pub fn exponential(max_attempts: usize, base: Duration) -> Self {
        Self::new(max_attempts, Backoff::Exponential { base })
    }

    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }

    pub fn immediate(max_attempts: usize) -> Self {
        Self::new(max_attempts, Backoff::None)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// 有限尝试序列：1..=max_attempts
    pub fn attempts(&self) -> impl Iterator<Item = Attempt> {
        let max = self.max_attempts;
        (1..=max).map(move |number| Attempt { number, max })
    }

    /// 第 attempt 次失败之后等待
    pub async fn pause(&self, attempt: Attempt) {
        let delay = self.backoff.delay_after(attempt.number);
        if !delay.is_zero() {
            tracing::info!("Retry after {} seconds...", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }

    /// 执行 op 直到成功、遇到不可重试错误或尝试耗尽；最后一次失败之后不再等待
    pub async fn run<T, E, F, Fut>(
        &self,
        mut op: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = Attempt {
            number: 1,
            max: self.max_attempts,
        };
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(RetryError::Fatal(e)),
                Err(e) => {
                    tracing::info!("Raise Exception ({}/{}): {}", attempt.number, attempt.max, e);
                    if attempt.is_last() {
                        return Err(RetryError::Exhausted {
                            attempts: self.max_attempts,
                            last: e,
                        });
                    }
                    self.pause(attempt).await;
                    attempt.number += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_exponential_delay() {
        let b = Backoff::Exponential {
            base: Duration::from_secs(60),
        };
        assert_eq!(b.delay_after(1), Duration::from_secs(120));
        assert_eq!(b.delay_after(2), Duration::from_secs(240));
        assert_eq!(Backoff::None.delay_after(3), Duration::ZERO);
    }

    #[test]
    fn test_attempts_are_bounded() {
        let policy = RetryPolicy::immediate(3);
        let seen: Vec<_> = policy.attempts().collect();
        assert_eq!(seen.len(), 3);
        assert!(seen[2].is_last());
        assert!(!seen[0].is_last());

        // 0 被提升为 1，保证至少尝试一次
        assert_eq!(RetryPolicy::immediate(0).attempts().count(), 1);
    }

    #[tokio::test]
    async fn test_run_exhausts_exactly_max_attempts() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::exponential(4, Duration::ZERO);
        let result: Result<(), _> = policy
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>("down".to_string()) }
                },
                |_| true,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert_eq!(last, "down");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_fatal() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(5);
        let result: Result<(), _> = policy
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>("schema".to_string()) }
                },
                |_| false,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetryError::Fatal(_))));
    }

    #[tokio::test]
    async fn test_run_returns_first_success() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(3);
        let value = policy
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt.number < 2 {
                            Err("flaky".to_string())
                        } else {
                            Ok(attempt.number)
                        }
                    }
                },
                |_| true,
            )
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
