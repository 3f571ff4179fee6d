//! 연도별 공휴일 집합과 캐시.
//!
//! 공휴일 원본은 외부 소스(내각부 CSV 등)에서 바이트 그대로 받아와 파싱합니다.
//! 소스 조회나 파싱에 실패한 연도는 빈 집합(주말만 휴장)으로 대체됩니다.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{CalendarError, CalendarResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 공휴일 원본 데이터 소스.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    /// 해당 연도의 공휴일 목록을 원본 바이트(CSV)로 반환.
    ///
    /// 첫 번째 컬럼이 날짜 문자열이며, 다른 연도의 행이 섞여 있어도 됩니다.
    async fn fetch_holiday_list(&self, year: i32) -> CalendarResult<Vec<u8>>;
}

/// 특정 연도의 공휴일 집합.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    pub year: i32,
    pub dates: HashSet<NaiveDate>,
}

impl HolidaySet {
    /// 빈 집합 (주말 규칙만 적용).
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            dates: HashSet::new(),
        }
    }

    /// 날짜 목록으로 생성. 다른 연도의 날짜는 제외됩니다.
    pub fn from_dates(year: i32, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            year,
            dates: dates.into_iter().filter(|d| d.year() == year).collect(),
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// 원본 CSV 바이트를 파싱합니다.
    ///
    /// UTF-8, Shift_JIS, EUC-JP 순으로 디코딩을 시도하고,
    /// 첫 번째 컬럼을 `YYYY/MM/DD`, `YYYY-MM-DD`, `YYYY.MM.DD` 형식으로 해석합니다.
    /// 헤더나 날짜가 아닌 행, 다른 연도의 행은 건너뜁니다.
    pub fn parse(year: i32, raw: &[u8]) -> CalendarResult<Self> {
        let (text, encoding) = decode_text(raw).ok_or_else(|| {
            CalendarError::source_unavailable(year, "지원하지 않는 인코딩")
        })?;
        debug!(year, encoding = encoding.name(), "공휴일 CSV 디코딩 완료");

        let dates = text
            .lines()
            .filter_map(|line| line.split(',').next())
            .filter_map(parse_date_token)
            .filter(|date| date.year() == year)
            .collect();

        Ok(Self { year, dates })
    }
}

/// UTF-8, Shift_JIS, EUC-JP 순서로 디코딩 시도.
fn decode_text(raw: &[u8]) -> Option<(String, &'static Encoding)> {
    [UTF_8, SHIFT_JIS, EUC_JP].into_iter().find_map(|encoding| {
        let bytes = if encoding == UTF_8 {
            raw.strip_prefix(UTF8_BOM).unwrap_or(raw)
        } else {
            raw
        };
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| (text.into_owned(), encoding))
    })
}

/// 날짜 토큰 파싱 (구분자 `/`, `-`, `.` 허용, 월/일 zero-padding 선택).
fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let normalized = token
        .trim()
        .trim_matches('"')
        .replace(['/', '.'], "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
}

/// 연도별 공휴일 캐시.
///
/// 연도당 한 번만 소스에서 로드하며 프로세스 수명 동안 유지합니다.
/// 읽기는 동시에 가능하고, 로드는 `load_lock`으로 직렬화됩니다 (double-checked).
pub struct HolidayCache {
    source: Option<Arc<dyn HolidaySource>>,
    years: RwLock<HashMap<i32, Arc<HolidaySet>>>,
    load_lock: Mutex<()>,
}

impl HolidayCache {
    /// 외부 소스 기반 캐시 생성.
    pub fn new(source: Arc<dyn HolidaySource>) -> Self {
        Self {
            source: Some(source),
            years: RwLock::new(HashMap::new()),
            load_lock: Mutex::new(()),
        }
    }

    /// 고정된 공휴일 집합으로 캐시 생성.
    ///
    /// 소스가 없으므로 등록되지 않은 연도는 주말 규칙만 적용됩니다.
    pub fn fixed(sets: impl IntoIterator<Item = HolidaySet>) -> Self {
        let years = sets
            .into_iter()
            .map(|set| (set.year, Arc::new(set)))
            .collect();
        Self {
            source: None,
            years: RwLock::new(years),
            load_lock: Mutex::new(()),
        }
    }

    /// 공휴일 없이 주말만 휴장으로 보는 캐시.
    pub fn weekend_only() -> Self {
        Self::fixed(std::iter::empty())
    }

    /// 연도의 공휴일 집합 조회 (캐시 미스 시 로드).
    pub async fn get(&self, year: i32) -> Arc<HolidaySet> {
        if let Some(set) = self.years.read().await.get(&year) {
            return Arc::clone(set);
        }

        let _guard = self.load_lock.lock().await;

        // 대기 중 다른 작업이 이미 로드했을 수 있음
        if let Some(set) = self.years.read().await.get(&year) {
            return Arc::clone(set);
        }

        let set = Arc::new(self.load(year).await);
        self.years.write().await.insert(year, Arc::clone(&set));
        set
    }

    /// 캐시된 연도 목록 (오름차순).
    pub async fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.years.read().await.keys().copied().collect();
        years.sort_unstable();
        years
    }

    async fn load(&self, year: i32) -> HolidaySet {
        let Some(source) = &self.source else {
            return HolidaySet::empty(year);
        };

        let loaded = match source.fetch_holiday_list(year).await {
            Ok(raw) => HolidaySet::parse(year, &raw),
            Err(e) => Err(e),
        };

        match loaded {
            Ok(set) => {
                info!(year, count = set.len(), "공휴일 로드 완료");
                set
            }
            Err(e) => {
                warn!(year, error = %e, "공휴일 로드 실패, 주말 규칙만 적용");
                HolidaySet::empty(year)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const CAO_SAMPLE: &str = "国民の祝日・休日月日,国民の祝日・休日名称\n\
                              2024/12/23,テスト\n\
                              2025/1/1,元日\n\
                              2025/1/13,成人の日\n\
                              2025-02-11,建国記念の日\n\
                              2025.10.13,スポーツの日\n\
                              not-a-date,???\n\
                              2026/1/1,元日\n";

    #[test]
    fn test_parse_utf8_mixed_separators() {
        let set = HolidaySet::parse(2025, CAO_SAMPLE.as_bytes()).unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.contains(&ymd(2025, 1, 1)));
        assert!(set.contains(&ymd(2025, 1, 13)));
        assert!(set.contains(&ymd(2025, 2, 11)));
        assert!(set.contains(&ymd(2025, 10, 13)));
        assert!(!set.contains(&ymd(2026, 1, 1)));
    }

    #[test]
    fn test_parse_utf8_with_bom() {
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice(b"2025/05/05,kodomo\n");
        let set = HolidaySet::parse(2025, &raw).unwrap();
        assert!(set.contains(&ymd(2025, 5, 5)));
    }

    #[test]
    fn test_parse_shift_jis() {
        let (encoded, _, had_errors) = SHIFT_JIS.encode(CAO_SAMPLE);
        assert!(!had_errors);
        assert!(std::str::from_utf8(&encoded).is_err());

        let set = HolidaySet::parse(2025, &encoded).unwrap();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_parse_euc_jp() {
        let (encoded, _, had_errors) = EUC_JP.encode("2025/11/3,文化の日\n");
        assert!(!had_errors);

        let set = HolidaySet::parse(2025, &encoded).unwrap();
        assert!(set.contains(&ymd(2025, 11, 3)));
    }

    #[test]
    fn test_parse_date_token() {
        assert_eq!(parse_date_token("2025/1/1"), Some(ymd(2025, 1, 1)));
        assert_eq!(parse_date_token(" \"2025-03-20\" "), Some(ymd(2025, 3, 20)));
        assert_eq!(parse_date_token("20250101"), None);
        assert_eq!(parse_date_token(""), None);
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl HolidaySource for CountingSource {
        async fn fetch_holiday_list(&self, year: i32) -> CalendarResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CalendarError::source_unavailable(year, "network down"));
            }
            Ok(CAO_SAMPLE.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_cache_loads_once_per_year() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = HolidayCache::new(source.clone());

        let first = cache.get(2025).await;
        let second = cache.get(2025).await;
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let next_year = cache.get(2026).await;
        assert_eq!(next_year.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_years().await, vec![2025, 2026]);
    }

    #[tokio::test]
    async fn test_cache_concurrent_load_is_single() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = Arc::new(HolidayCache::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get(2025).await.len() })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 4);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_source_failure_degrades_to_empty() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cache = HolidayCache::new(source.clone());

        assert!(cache.get(2025).await.is_empty());
        // 실패한 연도도 캐시되어 재조회하지 않음
        assert!(cache.get(2025).await.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fixed_cache_unknown_year_is_empty() {
        let cache = HolidayCache::fixed([HolidaySet::from_dates(2025, [ymd(2025, 1, 1)])]);
        assert!(cache.get(2025).await.contains(&ymd(2025, 1, 1)));
        assert!(cache.get(2030).await.is_empty());
    }
}
