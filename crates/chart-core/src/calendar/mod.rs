//! 영업일 캘린더.
//!
//! 주말(토/일)과 공휴일을 제외한 거래일을 판정합니다.
//! 모든 날짜 계산(수집 종료일 정규화, 검출 대상일 선정)의 기준이 됩니다.
//!
//! # 사용 예
//!
//! ```rust,ignore
//! let cache = Arc::new(HolidayCache::new(Arc::new(source)));
//! let calendar = BusinessDayCalendar::new(cache);
//!
//! let target = calendar.latest_trading_day_or_input(today).await;
//! ```

mod holiday;

pub use holiday::{HolidayCache, HolidaySet, HolidaySource};

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use tracing::{debug, info, warn};

use crate::error::{CalendarError, CalendarResult};

/// 직전 영업일 탐색 시 최대 확인 일수.
pub const MAX_LOOKBACK_DAYS: u32 = 10;

/// 주말/공휴일 기반 영업일 캘린더.
#[derive(Clone)]
pub struct BusinessDayCalendar {
    holidays: Arc<HolidayCache>,
}

impl BusinessDayCalendar {
    /// 공휴일 캐시를 주입하여 생성.
    pub fn new(holidays: Arc<HolidayCache>) -> Self {
        Self { holidays }
    }

    /// 주말만 휴장으로 보는 캘린더.
    pub fn weekend_only() -> Self {
        Self::new(Arc::new(HolidayCache::weekend_only()))
    }

    /// 토요일/일요일 여부.
    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 시장 기준(Asia/Tokyo) 오늘 날짜.
    pub fn market_today() -> NaiveDate {
        Utc::now().with_timezone(&chrono_tz::Asia::Tokyo).date_naive()
    }

    /// 거래일 여부.
    ///
    /// 해당 연도의 공휴일이 아직 로드되지 않았다면 먼저 로드합니다.
    pub async fn is_trading_day(&self, date: NaiveDate) -> bool {
        if Self::is_weekend(date) {
            return false;
        }
        !self.holidays.get(date.year()).await.contains(&date)
    }

    /// `date` 당일 또는 그 이전의 가장 가까운 거래일.
    ///
    /// `date`부터 하루씩 거슬러 올라가며 최대 [`MAX_LOOKBACK_DAYS`]일을 확인합니다.
    pub async fn latest_trading_day_on_or_before(
        &self,
        date: NaiveDate,
    ) -> CalendarResult<NaiveDate> {
        let found = self.scan_backward(date, date).await?;
        if found == date {
            debug!(date = %date, "영업일 확인 (조정 불필요)");
        } else {
            info!(from = %date, to = %found, "영업일 조정");
        }
        Ok(found)
    }

    /// [`latest_trading_day_on_or_before`](Self::latest_trading_day_on_or_before)의
    /// 실패 시 입력 날짜를 그대로 반환하는 버전.
    pub async fn latest_trading_day_or_input(&self, date: NaiveDate) -> NaiveDate {
        match self.latest_trading_day_on_or_before(date).await {
            Ok(found) => found,
            Err(e) => {
                warn!(date = %date, error = %e, "직전 영업일 탐색 실패, 입력 날짜 사용");
                date
            }
        }
    }

    /// `date` 이전(당일 제외)의 가장 가까운 거래일.
    pub async fn previous_trading_day(&self, date: NaiveDate) -> CalendarResult<NaiveDate> {
        let start = date.pred_opt().ok_or(CalendarError::Exhausted {
            date,
            lookback: MAX_LOOKBACK_DAYS,
        })?;
        self.scan_backward(start, date).await
    }

    /// `start`..=`end` 구간의 거래일 목록 (오름차순).
    ///
    /// 구간에 걸친 모든 연도의 공휴일을 먼저 로드합니다.
    pub async fn trading_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }

        let mut holidays = Vec::new();
        for year in start.year()..=end.year() {
            holidays.push(self.holidays.get(year).await);
        }

        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !Self::is_weekend(*d))
            .filter(|d| !holidays.iter().any(|set| set.contains(d)))
            .collect()
    }

    async fn scan_backward(&self, start: NaiveDate, origin: NaiveDate) -> CalendarResult<NaiveDate> {
        let mut check = start;
        for _ in 0..MAX_LOOKBACK_DAYS {
            if self.is_trading_day(check).await {
                return Ok(check);
            }
            check = match check.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        Err(CalendarError::Exhausted {
            date: origin,
            lookback: MAX_LOOKBACK_DAYS,
        })
    }
}
