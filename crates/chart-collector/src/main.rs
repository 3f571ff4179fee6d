//! 일봉 수집 / 시그널 검출 CLI.

use std::sync::Arc;

use chart_collector::config::parse_date;
use chart_collector::modules::{self, SignalDetectionRunner, SyncExecutor};
use chart_collector::{CollectorConfig, CollectorError};
use chart_core::{init_logging, BusinessDayCalendar, HolidayCache, LogConfig};
use chart_data::{
    BarRepository, CabinetOfficeHolidaySource, MarketDataSource, PgBarRepository,
    YahooMarketDataSource,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chart-collector")]
#[command(about = "Daily bar collector and hammer signal scanner", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 일봉 증분 동기화
    SyncOhlcv {
        /// 수집 종료일 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long, value_parser = parse_cli_date)]
        date: Option<NaiveDate>,

        /// 배치당 종목 수
        #[arg(long)]
        batch: Option<usize>,

        /// 처리 종목 수 제한
        #[arg(long)]
        test_limit: Option<usize>,

        /// 빠른 모드 (요청 간격 0.5초)
        #[arg(long, conflicts_with = "slow")]
        fast: bool,

        /// 안전 모드 (요청 간격 2초)
        #[arg(long)]
        slow: bool,
    },

    /// 하락 후 망치형 시그널 검출
    DetectSignals {
        /// 기준일 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long, value_parser = parse_cli_date)]
        date: Option<NaiveDate>,

        /// 테스트 모드 (앞쪽 일부 종목만)
        #[arg(long)]
        test: bool,
    },

    /// 전체 워크플로우 실행 (동기화 → 검출)
    RunAll,

    /// 데몬 모드: 주기적으로 전체 워크플로우 실행
    Daemon,

    /// 테이블 생성
    InitDb,
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

/// 실행에 필요한 구성 요소.
struct Components {
    repository: Arc<PgBarRepository>,
    source: Arc<dyn MarketDataSource>,
    calendar: BusinessDayCalendar,
}

impl Components {
    async fn build(config: &CollectorConfig) -> Result<Self, CollectorError> {
        let repository = Arc::new(PgBarRepository::connect(&config.database_url).await?);
        tracing::info!("데이터베이스 연결 성공");

        let holiday_source =
            CabinetOfficeHolidaySource::with_url(&config.holiday.url, &config.holiday.cache_dir)?;
        let calendar =
            BusinessDayCalendar::new(Arc::new(HolidayCache::new(Arc::new(holiday_source))));

        let source: Arc<dyn MarketDataSource> = Arc::new(YahooMarketDataSource::new()?);

        Ok(Self {
            repository,
            source,
            calendar,
        })
    }

    fn bar_repository(&self) -> Arc<dyn BarRepository> {
        self.repository.clone()
    }

    fn sync_executor(&self, config: &CollectorConfig) -> SyncExecutor {
        SyncExecutor::new(
            self.bar_repository(),
            self.source.clone(),
            self.calendar.clone(),
            &config.sync,
        )
    }

    fn detection_runner(&self, config: &CollectorConfig) -> SignalDetectionRunner {
        SignalDetectionRunner::new(self.bar_repository(), self.calendar.clone(), &config.detect)
    }
}

/// 동기화 → 검출 순서로 실행. 동기화 실패 시에도 검출은 진행합니다.
async fn run_workflow(components: &Components, config: &CollectorConfig) {
    match components
        .sync_executor(config)
        .run(config.sync.target_date, config.sync.test_limit)
        .await
    {
        Ok(stats) => stats.log_summary("일봉 동기화"),
        Err(e) => tracing::error!("일봉 동기화 실패: {}", e),
    }

    match components.detection_runner(config).run(None, None).await {
        Ok(stats) => stats.log_summary("시그널 검출"),
        Err(e) => tracing::error!("시그널 검출 실패: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(LogConfig::new(cli.log_level.as_str()).with_env_format())?;

    tracing::info!("Chart Collector 시작");

    let mut config = CollectorConfig::from_env()?;
    tracing::debug!(database_url = %config.database_url, "설정 로드 완료");

    if let Commands::InitDb = cli.command {
        let repository = PgBarRepository::connect(&config.database_url).await?;
        modules::init_db(&repository).await?;
        repository.close().await;
        return Ok(());
    }

    let components = Components::build(&config).await?;

    match cli.command {
        Commands::SyncOhlcv {
            date,
            batch,
            test_limit,
            fast,
            slow,
        } => {
            if let Some(batch) = batch {
                config.sync.batch_size = batch;
            }
            if fast {
                config.sync.request_delay_ms = 500;
            } else if slow {
                config.sync.request_delay_ms = 2000;
            }
            let stats = components
                .sync_executor(&config)
                .run(date.or(config.sync.target_date), test_limit.or(config.sync.test_limit))
                .await?;
            stats.log_summary("일봉 동기화");
        }
        Commands::DetectSignals { date, test } => {
            let limit = test.then_some(config.detect.test_limit);
            let stats = components
                .detection_runner(&config)
                .run(date, limit)
                .await?;
            stats.log_summary("시그널 검출");
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");
            run_workflow(&components, &config).await;
            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 워크플로우 실행 시작 ===");
                        run_workflow(&components, &config).await;
                        tracing::info!(
                            "=== 워크플로우 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
        Commands::InitDb => {}
    }

    components.repository.close().await;
    tracing::info!("Chart Collector 종료");

    Ok(())
}
