//! 실행 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 일봉 동기화 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// 처리한 종목 수
    pub total: usize,
    /// 신규 수집 성공
    pub new: usize,
    /// 업데이트 성공
    pub updated: usize,
    /// 건너뛴 종목 (이미 최신)
    pub skipped: usize,
    /// 빈 데이터 (조회 성공, 추가 데이터 없음)
    pub empty: usize,
    /// 실패 (조회 또는 저장)
    pub failed: usize,
    /// 저장된 총 일봉 수
    pub records: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%). 스킵은 성공으로 봅니다.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.total - self.failed) as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            new = self.new,
            updated = self.updated,
            skipped = self.skipped,
            empty = self.empty,
            failed = self.failed,
            records = self.records,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );
    }
}

/// 동기화 계획 분석 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// 신규 수집 대상
    pub new: usize,
    /// 업데이트 대상
    pub update: usize,
    /// 스킵 대상
    pub skip: usize,
    /// 날짜 범위 조회 실패
    pub failed: usize,
    /// 예상 수집 레코드 수 (달력일 기준)
    pub estimated_records: i64,
    /// 예상 소요 시간 (요청 간격 기준)
    #[serde(skip)]
    pub estimated_duration: Duration,
}

impl PlanSummary {
    /// 조회가 필요한 종목 수
    pub fn fetch_count(&self) -> usize {
        self.new + self.update
    }

    pub fn log_summary(&self) {
        tracing::info!(
            new = self.new,
            update = self.update,
            skip = self.skip,
            failed = self.failed,
            estimated_records = self.estimated_records,
            estimated_minutes = format!("{:.1}", self.estimated_duration.as_secs_f64() / 60.0),
            "동기화 계획 분석"
        );
    }
}

/// 시그널 검출 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionStats {
    /// 처리한 종목 수
    pub processed: usize,
    /// 검출된 시그널 수
    pub signals: usize,
    /// 에러 종목 수
    pub errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl DetectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            processed = self.processed,
            signals = self.signals,
            errors = self.errors,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "검출 완료"
        );
    }
}
