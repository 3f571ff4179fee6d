//! 일봉(OHLCV) 데이터.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BarError;

/// 하루치 OHLCV 데이터.
///
/// (symbol, date) 조합당 하나만 존재하며, 날짜 오름차순이 종목의 거래 순서입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// 종목 심볼 (예: "7203.T")
    pub symbol: String,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: i64,
}

impl Bar {
    /// 새 일봉을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 캔들 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 윗꼬리 길이.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// 아랫꼬리 길이.
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    /// 저장 전 필드 검증.
    ///
    /// 음수 가격/거래량, 고가 < 저가인 행은 거부합니다.
    pub fn validate(&self) -> Result<(), BarError> {
        let malformed = |reason: &str| BarError::Malformed {
            symbol: self.symbol.clone(),
            date: self.date.to_string(),
            reason: reason.to_string(),
        };

        if [self.open, self.high, self.low, self.close]
            .iter()
            .any(|p| p.is_sign_negative())
        {
            return Err(malformed("음수 가격"));
        }
        if self.volume < 0 {
            return Err(malformed("음수 거래량"));
        }
        if self.high < self.low {
            return Err(malformed("고가가 저가보다 낮음"));
        }
        Ok(())
    }
}
