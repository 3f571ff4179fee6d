//! 스키마 초기화 모듈.

use chart_data::PgBarRepository;

use crate::Result;

/// `stock_master`, `stocks`, `signal_detections` 테이블 생성 (이미 있으면 유지).
pub async fn init_db(repository: &PgBarRepository) -> Result<()> {
    tracing::info!("스키마 초기화 시작");
    repository.ensure_schema().await?;
    tracing::info!("스키마 초기화 완료");
    Ok(())
}
