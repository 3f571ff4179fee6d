//! 증분 동기화 계획.
//!
//! 종목별로 로컬에 저장된 날짜 범위(high-water mark)와 목표 종료일을 비교하여
//! 외부 소스에서 가져와야 할 구간을 결정합니다.
//!
//! | 로컬 범위               | 상태     | 조회 구간                     |
//! |-------------------------|----------|-------------------------------|
//! | 없음                    | `New`    | 기준 시작일 ~ 목표일          |
//! | `max >= 목표일`         | `Skip`   | 없음                          |
//! | `max < 목표일`          | `Update` | `max + 1일` ~ 목표일          |

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// 종목의 로컬 데이터 날짜 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateRange {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Self {
        Self { min, max }
    }
}

/// 동기화 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    /// 로컬 데이터 없음, 기준 시작일부터 전체 수집
    New,
    /// 마지막 저장일 다음 날부터 증분 수집
    Update,
    /// 이미 최신
    Skip,
}

impl SyncStatus {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Update => "update",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 종목 하나에 대한 수집 계획.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    New { start: NaiveDate, end: NaiveDate },
    Update { start: NaiveDate, end: NaiveDate },
    Skip,
}

impl FetchPlan {
    pub fn status(&self) -> SyncStatus {
        match self {
            Self::New { .. } => SyncStatus::New,
            Self::Update { .. } => SyncStatus::Update,
            Self::Skip => SyncStatus::Skip,
        }
    }

    /// 조회 구간 (`Skip`이면 `None`).
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            Self::New { start, end } | Self::Update { start, end } => Some((start, end)),
            Self::Skip => None,
        }
    }

    /// 조회 구간의 달력 일수 (수집량 추정용).
    pub fn estimated_days(&self) -> i64 {
        self.window()
            .map(|(start, end)| (end - start).num_days().max(0))
            .unwrap_or(0)
    }
}

/// 증분 동기화 계획기.
#[derive(Debug, Clone, Copy)]
pub struct SyncPlanner {
    base_start_date: NaiveDate,
}

impl SyncPlanner {
    /// `base_start_date`: 신규 종목의 수집 시작일
    pub fn new(base_start_date: NaiveDate) -> Self {
        Self { base_start_date }
    }

    pub fn base_start_date(&self) -> NaiveDate {
        self.base_start_date
    }

    /// 수집 구간 계산.
    ///
    /// `target_end`는 호출 측에서 이미 직전 영업일로 정규화된 날짜여야 합니다.
    pub fn plan_fetch(&self, local_range: Option<DateRange>, target_end: NaiveDate) -> FetchPlan {
        let Some(range) = local_range else {
            return FetchPlan::New {
                start: self.base_start_date,
                end: target_end,
            };
        };

        if range.max >= target_end {
            return FetchPlan::Skip;
        }

        match range.max.checked_add_days(Days::new(1)) {
            Some(start) => FetchPlan::Update {
                start,
                end: target_end,
            },
            None => FetchPlan::Skip,
        }
    }
}
