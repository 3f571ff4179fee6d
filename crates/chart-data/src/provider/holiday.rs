//! 내각부(内閣府) 공휴일 CSV 소스.
//!
//! 전체 연도의 공휴일이 한 파일에 들어 있는 CSV를 내려받아
//! `<cache_dir>/<year>.csv`로 저장하고, 이후에는 로컬 파일을 사용합니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chart_core::{CalendarError, CalendarResult, HolidaySource};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};

/// 내각부 공휴일 CSV 기본 URL.
pub const CABINET_OFFICE_HOLIDAY_URL: &str =
    "https://www8.cao.go.jp/chosei/shukujitsu/syukujitsu.csv";

/// 내각부 공휴일 CSV 소스.
pub struct CabinetOfficeHolidaySource {
    client: Client,
    url: String,
    cache_dir: PathBuf,
}

impl CabinetOfficeHolidaySource {
    /// 기본 URL로 생성.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_url(CABINET_OFFICE_HOLIDAY_URL, cache_dir)
    }

    pub fn with_url(url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            cache_dir: cache_dir.into(),
        })
    }

    fn cache_path(&self, year: i32) -> PathBuf {
        self.cache_dir.join(format!("{}.csv", year))
    }

    async fn download(&self, year: i32) -> CalendarResult<Vec<u8>> {
        info!(url = %self.url, year, "공휴일 CSV 다운로드");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CalendarError::source_unavailable(year, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::source_unavailable(
                year,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CalendarError::source_unavailable(year, e.to_string()))?;
        Ok(body.to_vec())
    }
}

async fn write_cache(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, body).await
}

#[async_trait]
impl HolidaySource for CabinetOfficeHolidaySource {
    async fn fetch_holiday_list(&self, year: i32) -> CalendarResult<Vec<u8>> {
        let path = self.cache_path(year);

        if let Ok(body) = tokio::fs::read(&path).await {
            debug!(path = %path.display(), "공휴일 CSV 캐시 사용");
            return Ok(body);
        }

        let body = self.download(year).await?;

        // 파일 캐시 실패는 이번 조회 결과에 영향 없음
        if let Err(e) = write_cache(&path, &body).await {
            warn!(path = %path.display(), error = %e, "공휴일 CSV 캐시 저장 실패");
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_core::HolidaySet;

    fn temp_cache_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "chart-holiday-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn test_download_then_file_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/syukujitsu.csv")
            .with_status(200)
            .with_body("date,name\n2025/1/1,ganjitsu\n2025/1/13,seijin\n")
            .expect(1)
            .create_async()
            .await;

        let dir = temp_cache_dir("download");
        let source = CabinetOfficeHolidaySource::with_url(
            format!("{}/syukujitsu.csv", server.url()),
            &dir,
        )
        .unwrap();

        let first = source.fetch_holiday_list(2025).await.unwrap();
        assert!(dir.join("2025.csv").exists());

        // 두 번째 조회는 파일 캐시 사용 (HTTP 호출 1회)
        let second = source.fetch_holiday_list(2025).await.unwrap();
        assert_eq!(first, second);
        mock.assert_async().await;

        let set = HolidaySet::parse(2025, &second).unwrap();
        assert_eq!(set.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_http_error_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/syukujitsu.csv")
            .with_status(503)
            .create_async()
            .await;

        let dir = temp_cache_dir("http-error");
        let source = CabinetOfficeHolidaySource::with_url(
            format!("{}/syukujitsu.csv", server.url()),
            &dir,
        )
        .unwrap();

        let result = source.fetch_holiday_list(2025).await;
        assert!(matches!(
            result,
            Err(CalendarError::HolidaySourceUnavailable { year: 2025, .. })
        ));
        assert!(!dir.join("2025.csv").exists());
    }
}
