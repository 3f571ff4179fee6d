//! 환경변수 기반 설정 모듈.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::CollectorError;
use crate::Result;

/// 기본 수집 시작일 (신규 종목).
pub const DEFAULT_BASE_START_DATE: &str = "2025-01-06";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 일봉 동기화 설정
    pub sync: SyncConfig,
    /// 시그널 검출 설정
    pub detect: DetectConfig,
    /// 공휴일 소스 설정
    pub holiday: HolidayConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 일봉 동기화 설정
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 배치당 종목 수
    pub batch_size: usize,
    /// API 요청 간 최소 간격 (밀리초)
    pub request_delay_ms: u64,
    /// 종목당 최대 시도 횟수
    pub max_retries: u32,
    /// 재시도 기본 대기 (밀리초, 시도 횟수만큼 배수)
    pub retry_delay_ms: u64,
    /// 신규 종목 수집 시작일
    pub base_start_date: NaiveDate,
    /// 수집 종료일 (미지정 시 오늘)
    pub target_date: Option<NaiveDate>,
    /// 처리 종목 수 제한 (테스트용)
    pub test_limit: Option<usize>,
}

/// 시그널 검출 설정
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// 윈도우 캔들 수
    pub lookback: usize,
    /// 최소 연속 하락 일수
    pub min_decline_days: u32,
    /// `--test` 실행 시 종목 수
    pub test_limit: usize,
}

/// 공휴일 소스 설정
#[derive(Debug, Clone)]
pub struct HolidayConfig {
    /// 공휴일 CSV URL
    pub url: String,
    /// 연도별 CSV 캐시 디렉터리
    pub cache_dir: PathBuf,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            request_delay_ms: 1000,
            max_retries: 3,
            retry_delay_ms: 2000,
            base_start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap_or_default(),
            target_date: None,
            test_limit: None,
        }
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            min_decline_days: 4,
            test_limit: 10,
        }
    }
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            url: chart_data::provider::holiday::CABINET_OFFICE_HOLIDAY_URL.to_string(),
            cache_dir: PathBuf::from("data_collector"),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let base_start_date = env_var_date("SYNC_BASE_START_DATE")?
            .unwrap_or(SyncConfig::default().base_start_date);
        let holiday_defaults = HolidayConfig::default();

        Ok(Self {
            database_url,
            sync: SyncConfig {
                batch_size: env_var_parse("SYNC_BATCH_SIZE", 50),
                request_delay_ms: env_var_parse("SYNC_REQUEST_DELAY_MS", 1000),
                max_retries: env_var_parse("SYNC_MAX_RETRIES", 3),
                retry_delay_ms: env_var_parse("SYNC_RETRY_DELAY_MS", 2000),
                base_start_date,
                target_date: env_var_date("SYNC_TARGET_DATE")?,
                test_limit: std::env::var("SYNC_TEST_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            detect: DetectConfig {
                lookback: env_var_parse("DETECT_LOOKBACK", 20),
                min_decline_days: env_var_parse("DETECT_MIN_DECLINE_DAYS", 4),
                test_limit: env_var_parse("DETECT_TEST_LIMIT", 10),
            },
            holiday: HolidayConfig {
                url: std::env::var("HOLIDAY_CSV_URL").unwrap_or(holiday_defaults.url),
                cache_dir: std::env::var("HOLIDAY_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(holiday_defaults.cache_dir),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        })
    }
}

impl SyncConfig {
    /// API 요청 간 최소 간격을 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 재시도 기본 대기를 Duration으로 반환
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// `YYYY-MM-DD` 날짜 파싱.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| CollectorError::Config(format!("잘못된 날짜 형식 '{}': {}", value, e)))
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 날짜 파싱 (형식 오류는 설정 에러)
fn env_var_date(key: &str) -> Result<Option<NaiveDate>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => parse_date(&v).map(Some),
        _ => Ok(None),
    }
}
