//! 데이터 모듈 오류 타입.

use chart_core::BarError;
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스/외부 서버 연결 오류
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 타임아웃 오류
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// 데이터 가져오기 오류 (외부 소스, 일시적)
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// OHLCV 필드가 누락/손상된 행
    #[error("Malformed bar: {0}")]
    MalformedBar(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DataError {
    /// 재시도하면 성공할 수 있는 일시적 오류인지 확인합니다.
    ///
    /// "데이터 없음"은 오류가 아니라 빈 결과로 표현되므로 여기에 포함되지 않습니다.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::ConnectionError(_)
                | DataError::FetchError(_)
                | DataError::Timeout(_)
                | DataError::PoolExhausted
        )
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<BarError> for DataError {
    fn from(err: BarError) -> Self {
        DataError::MalformedBar(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
