//! 에러 타입 정의.

use std::fmt;

use chart_data::DataError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 저장소 에러
    Database(DataError),
    /// 설정 에러
    Config(String),
    /// 재시도 후에도 조회 실패
    FetchFailed {
        symbol: String,
        attempts: u32,
        reason: String,
    },
    /// 일봉/시그널 저장 실패
    PersistenceFailed { symbol: String, source: DataError },
    /// 처리할 종목이 없음
    EmptyUniverse,
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::FetchFailed {
                symbol,
                attempts,
                reason,
            } => write!(
                f,
                "Fetch failed for {} after {} attempts: {}",
                symbol, attempts, reason
            ),
            Self::PersistenceFailed { symbol, source } => {
                write!(f, "Persistence failed for {}: {}", symbol, source)
            }
            Self::EmptyUniverse => write!(f, "No securities to process"),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            Self::PersistenceFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Database(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
