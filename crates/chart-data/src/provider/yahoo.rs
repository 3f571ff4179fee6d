//! Yahoo Finance 일봉 데이터 소스.

use async_trait::async_trait;
use chart_core::Bar;
use chrono::{Datelike, Days, NaiveDate, TimeZone};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api::{Quote, YahooConnector, YahooError};

use super::MarketDataSource;
use crate::error::{DataError, Result};

/// Yahoo Finance 기반 일봉 소스.
pub struct YahooMarketDataSource {
    connector: YahooConnector,
    /// 일봉 타임스탬프를 거래일로 변환할 거래소 시간대
    market_tz: Tz,
}

impl YahooMarketDataSource {
    /// 도쿄 거래소 시간대로 생성.
    pub fn new() -> Result<Self> {
        Self::with_timezone(chrono_tz::Asia::Tokyo)
    }

    pub fn with_timezone(market_tz: Tz) -> Result<Self> {
        let connector = YahooConnector::new()
            .map_err(|e| DataError::ConnectionError(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self {
            connector,
            market_tz,
        })
    }

    /// Quote 한 건을 일봉으로 변환.
    fn quote_to_bar(&self, symbol: &str, quote: &Quote) -> Result<Bar> {
        let date = self
            .market_tz
            .timestamp_opt(quote.timestamp as i64, 0)
            .single()
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                DataError::MalformedBar(format!("{}: 잘못된 타임스탬프 {}", symbol, quote.timestamp))
            })?;

        let price = |value: f64, field: &str| {
            Decimal::from_f64_retain(value)
                .map(|d| d.round_dp(4))
                .ok_or_else(|| DataError::MalformedBar(format!("{} {}: {} = {}", symbol, date, field, value)))
        };
        let volume = i64::try_from(quote.volume)
            .map_err(|_| DataError::MalformedBar(format!("{} {}: volume 범위 초과", symbol, date)))?;

        let bar = Bar::new(
            symbol,
            date,
            price(quote.open, "open")?,
            price(quote.high, "high")?,
            price(quote.low, "low")?,
            price(quote.close, "close")?,
            volume,
        );
        bar.validate()?;
        Ok(bar)
    }
}

#[async_trait]
impl MarketDataSource for YahooMarketDataSource {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        if start > end {
            return Ok(Vec::new());
        }

        // Yahoo의 종료 시각은 배타적이므로 하루를 더함
        let exclusive_end = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| DataError::ParseError(format!("종료일 범위 초과: {}", end)))?;

        debug!(symbol = symbol, start = %start, end = %end, "Yahoo Finance 날짜 범위 호출");

        let response = match self
            .connector
            .get_quote_history_interval(
                symbol,
                naive_date_to_offset_datetime(start)?,
                naive_date_to_offset_datetime(exclusive_end)?,
                "1d",
            )
            .await
        {
            Ok(response) => response,
            Err(e) if is_no_data(&e) => return Ok(Vec::new()),
            Err(e) => {
                return Err(DataError::FetchError(format!(
                    "Yahoo Finance API 오류 ({}): {}",
                    symbol, e
                )))
            }
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) if is_no_data(&e) => return Ok(Vec::new()),
            Err(e) => return Err(DataError::ParseError(format!("Quote 파싱 오류: {}", e))),
        };

        let mut bars: Vec<Bar> = quotes
            .iter()
            .filter_map(|q| match self.quote_to_bar(symbol, q) {
                Ok(bar) => Some(bar),
                Err(e) => {
                    warn!(symbol = symbol, error = %e, "잘못된 일봉 행 건너뜀");
                    None
                }
            })
            .filter(|bar| bar.date >= start && bar.date <= end)
            .collect();

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }
}

/// 조회 구간에 데이터가 없다는 응답인지 여부.
fn is_no_data(err: &YahooError) -> bool {
    matches!(err, YahooError::NoQuotes | YahooError::NoResult)
}

/// NaiveDate를 UTC 자정 OffsetDateTime으로 변환.
fn naive_date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let month = time::Month::try_from(date.month() as u8)
        .map_err(|e| DataError::ParseError(e.to_string()))?;
    let date = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|e| DataError::ParseError(e.to_string()))?;
    Ok(date.midnight().assume_utc())
}
