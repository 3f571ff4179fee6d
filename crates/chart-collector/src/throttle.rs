//! 외부 요청 간 최소 간격 보장.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// 요청 스로틀.
///
/// 연속된 `acquire` 호출 사이에 최소 `min_interval`이 지나도록 대기합니다.
/// 첫 호출은 대기하지 않습니다.
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 다음 요청 허용 시점까지 대기합니다.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let next_allowed = prev + self.min_interval;
            if next_allowed > Instant::now() {
                tokio::time::sleep_until(next_allowed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
