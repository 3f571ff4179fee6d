//! 배치 작업 모듈.

pub mod ohlcv_sync;
pub mod schema;
pub mod signal_detect;

pub use ohlcv_sync::{SymbolPlan, SyncExecutor};
pub use schema::init_db;
pub use signal_detect::SignalDetectionRunner;
