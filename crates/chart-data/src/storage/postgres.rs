//! PostgreSQL 일봉/시그널 저장소.
//!
//! # 테이블
//!
//! - `stock_master`: 종목 마스터 (읽기 전용)
//! - `stocks`: 일봉, PK (symbol, date)
//! - `signal_detections`: 시그널, UNIQUE (symbol, signal_date, signal_type)

use async_trait::async_trait;
use chart_core::{Bar, DateRange, Security, SignalDetection};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use super::{BarRepository, DataStatistics};
use crate::error::{DataError, Result};

/// 스키마 생성 DDL (존재하지 않을 때만).
const SCHEMA_STATEMENTS: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS stock_master (
        code        VARCHAR(16) PRIMARY KEY,
        symbol      VARCHAR(32) NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        sector      TEXT,
        market      TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        symbol      VARCHAR(32) NOT NULL,
        date        DATE NOT NULL,
        open        NUMERIC(18, 4) NOT NULL,
        high        NUMERIC(18, 4) NOT NULL,
        low         NUMERIC(18, 4) NOT NULL,
        close       NUMERIC(18, 4) NOT NULL,
        volume      BIGINT NOT NULL,
        PRIMARY KEY (symbol, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS signal_detections (
        id                  BIGSERIAL PRIMARY KEY,
        symbol              VARCHAR(32) NOT NULL,
        signal_date         DATE NOT NULL,
        signal_type         VARCHAR(64) NOT NULL,
        detection_date      TIMESTAMPTZ NOT NULL,
        hammer_open         NUMERIC(18, 4) NOT NULL,
        hammer_high         NUMERIC(18, 4) NOT NULL,
        hammer_low          NUMERIC(18, 4) NOT NULL,
        hammer_close        NUMERIC(18, 4) NOT NULL,
        hammer_volume       BIGINT NOT NULL,
        lower_shadow_ratio  NUMERIC(6, 2) NOT NULL,
        upper_shadow_ratio  NUMERIC(6, 2) NOT NULL,
        body_ratio          NUMERIC(6, 2) NOT NULL,
        decline_days        INTEGER NOT NULL,
        decline_start_date  DATE NOT NULL,
        decline_start_price NUMERIC(18, 4) NOT NULL,
        decline_end_price   NUMERIC(18, 4) NOT NULL,
        total_decline_pct   NUMERIC(8, 2) NOT NULL,
        stock_name          TEXT,
        market              TEXT,
        sector              TEXT,
        UNIQUE (symbol, signal_date, signal_type)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_signal_detections_date
        ON signal_detections (signal_date DESC)
    "#,
];

/// `stocks` 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
struct BarRecord {
    symbol: String,
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: i64,
}

impl From<BarRecord> for Bar {
    fn from(r: BarRecord) -> Self {
        Bar::new(r.symbol, r.date, r.open, r.high, r.low, r.close, r.volume)
    }
}

/// `stock_master` 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
struct SecurityRecord {
    code: String,
    symbol: String,
    name: String,
    sector: Option<String>,
    market: Option<String>,
}

impl From<SecurityRecord> for Security {
    fn from(r: SecurityRecord) -> Self {
        Security {
            code: r.code,
            symbol: r.symbol,
            name: r.name,
            sector: r.sector,
            market: r.market,
        }
    }
}

/// PostgreSQL 기반 저장소.
#[derive(Clone)]
pub struct PgBarRepository {
    pool: PgPool,
}

impl PgBarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 문자열로 풀을 생성하여 저장소 생성.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 테이블/인덱스 생성.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("스키마 확인 완료");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl BarRepository for PgBarRepository {
    async fn list_securities(&self) -> Result<Vec<Security>> {
        let records: Vec<SecurityRecord> = sqlx::query_as(
            r#"
            SELECT code, symbol, name, sector, market
            FROM stock_master
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Security::from).collect())
    }

    async fn list_bar_symbols(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT symbol FROM stocks ORDER BY symbol")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    async fn get_security(&self, symbol: &str) -> Result<Option<Security>> {
        let record: Option<SecurityRecord> = sqlx::query_as(
            r#"
            SELECT code, symbol, name, sector, market
            FROM stock_master
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Security::from))
    }

    #[instrument(skip(self))]
    async fn get_date_range(&self, symbol: &str) -> Result<Option<DateRange>> {
        let (min, max): (Option<NaiveDate>, Option<NaiveDate>) =
            sqlx::query_as("SELECT MIN(date), MAX(date) FROM stocks WHERE symbol = $1")
                .bind(symbol)
                .fetch_one(&self.pool)
                .await?;

        Ok(min.zip(max).map(|(min, max)| DateRange::new(min, max)))
    }

    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut written = 0;

        // UNNEST 패턴으로 일괄 upsert
        for chunk in bars.chunks(500) {
            let symbols: Vec<&str> = chunk.iter().map(|_| symbol).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|b| b.date).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|b| b.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|b| b.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|b| b.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|b| b.close).collect();
            let volumes: Vec<i64> = chunk.iter().map(|b| b.volume).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO stocks (symbol, date, open, high, low, close, volume)
                SELECT * FROM UNNEST(
                    $1::text[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[],
                    $7::int8[]
                )
                ON CONFLICT (symbol, date) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    volume = EXCLUDED.volume
                "#,
            )
            .bind(&symbols)
            .bind(&dates)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&volumes)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            written += result.rows_affected() as usize;
        }

        debug!(symbol = symbol, written = written, "일봉 저장 완료");
        Ok(written)
    }

    #[instrument(skip(self))]
    async fn get_window(
        &self,
        symbol: &str,
        end_inclusive: NaiveDate,
        max_count: usize,
    ) -> Result<Vec<Bar>> {
        let records: Vec<BarRecord> = sqlx::query_as(
            r#"
            SELECT symbol, date, open, high, low, close, volume
            FROM stocks
            WHERE symbol = $1 AND date <= $2
            ORDER BY date DESC
            LIMIT $3
            "#,
        )
        .bind(symbol)
        .bind(end_inclusive)
        .bind(max_count as i64)
        .fetch_all(&self.pool)
        .await?;

        // 오래된 순으로 정렬
        let mut bars: Vec<Bar> = records.into_iter().map(Bar::from).collect();
        bars.reverse();
        Ok(bars)
    }

    #[instrument(skip(self, detection), fields(symbol = %detection.symbol, date = %detection.signal_date))]
    async fn upsert_signal(&self, detection: &SignalDetection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO signal_detections (
                symbol, signal_date, signal_type, detection_date,
                hammer_open, hammer_high, hammer_low, hammer_close, hammer_volume,
                lower_shadow_ratio, upper_shadow_ratio, body_ratio,
                decline_days, decline_start_date, decline_start_price, decline_end_price,
                total_decline_pct, stock_name, market, sector
            ) VALUES (
                $1, $2, $3, $4,
                $5, $6, $7, $8, $9,
                $10, $11, $12,
                $13, $14, $15, $16,
                $17, $18, $19, $20
            )
            ON CONFLICT (symbol, signal_date, signal_type) DO UPDATE SET
                detection_date = EXCLUDED.detection_date,
                lower_shadow_ratio = EXCLUDED.lower_shadow_ratio,
                upper_shadow_ratio = EXCLUDED.upper_shadow_ratio,
                body_ratio = EXCLUDED.body_ratio,
                decline_days = EXCLUDED.decline_days,
                decline_start_date = EXCLUDED.decline_start_date,
                decline_start_price = EXCLUDED.decline_start_price,
                decline_end_price = EXCLUDED.decline_end_price,
                total_decline_pct = EXCLUDED.total_decline_pct
            "#,
        )
        .bind(&detection.symbol)
        .bind(detection.signal_date)
        .bind(&detection.signal_type)
        .bind(detection.detected_at)
        .bind(detection.hammer_open)
        .bind(detection.hammer_high)
        .bind(detection.hammer_low)
        .bind(detection.hammer_close)
        .bind(detection.hammer_volume)
        .bind(detection.lower_shadow_ratio)
        .bind(detection.upper_shadow_ratio)
        .bind(detection.body_ratio)
        .bind(detection.decline_days as i32)
        .bind(detection.decline_start_date)
        .bind(detection.decline_start_price)
        .bind(detection.decline_end_price)
        .bind(detection.total_decline_pct)
        .bind(detection.stock_name.as_deref())
        .bind(detection.market.as_deref())
        .bind(detection.sector.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| DataError::InsertError(e.to_string()))?;

        Ok(())
    }

    async fn data_statistics(&self) -> Result<DataStatistics> {
        let (unique_symbols, total_records, earliest_date, latest_date): (
            i64,
            i64,
            Option<NaiveDate>,
            Option<NaiveDate>,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT symbol), COUNT(*), MIN(date), MAX(date)
            FROM stocks
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let latest_date_distribution: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r#"
            SELECT latest_date, COUNT(*)
            FROM (
                SELECT symbol, MAX(date) AS latest_date
                FROM stocks
                GROUP BY symbol
            ) AS latest_by_symbol
            GROUP BY latest_date
            ORDER BY latest_date DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DataStatistics {
            unique_symbols,
            total_records,
            earliest_date,
            latest_date,
            latest_date_distribution,
        })
    }
}
