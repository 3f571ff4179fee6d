//! 핵심 도메인 에러 타입.

use chrono::NaiveDate;
use thiserror::Error;

/// 영업일 캘린더 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    /// 제한된 범위 내에서 영업일을 찾지 못함 (휴일 데이터 손상 의심)
    #[error("영업일을 찾을 수 없음: {date} 기준 {lookback}일 탐색")]
    Exhausted { date: NaiveDate, lookback: u32 },

    /// 휴일 데이터 소스 조회/파싱 실패
    #[error("휴일 데이터 소스 사용 불가 ({year}년): {reason}")]
    HolidaySourceUnavailable { year: i32, reason: String },
}

impl CalendarError {
    /// 휴일 소스 에러 생성 헬퍼.
    pub fn source_unavailable(year: i32, reason: impl Into<String>) -> Self {
        Self::HolidaySourceUnavailable {
            year,
            reason: reason.into(),
        }
    }
}

/// 일봉 데이터 검증 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BarError {
    /// OHLCV 필드가 누락되었거나 유효하지 않음
    #[error("잘못된 일봉 데이터 ({symbol} {date}): {reason}")]
    Malformed {
        symbol: String,
        date: String,
        reason: String,
    },
}

/// 캘린더 작업을 위한 Result 타입.
pub type CalendarResult<T> = Result<T, CalendarError>;
