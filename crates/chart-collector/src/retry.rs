//! 선형 백오프 재시도 정책.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// 재시도 정책.
///
/// `n`번째 시도가 실패하면 `n × base_delay`만큼 대기 후 다시 시도합니다.
/// 재시도 가능 여부는 호출 측의 판별 함수가 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 기본 대기 시간
    pub base_delay: Duration,
}

/// 재시도 후 최종 실패.
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// 마지막 에러
    pub error: E,
    /// 실제 시도 횟수
    pub attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// `attempt`번째 시도 실패 후 대기 시간.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// 작업을 실행하고 일시적 에러면 재시도합니다.
    ///
    /// 재시도할 수 없는 에러는 즉시 반환합니다.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts && is_retryable(&error) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        label = label,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "재시도 예정"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(label = label, attempts = attempt, error = %error, "최종 실패");
                    return Err(RetryFailure {
                        error,
                        attempts: attempt,
                    });
                }
            }
        }
    }
}
