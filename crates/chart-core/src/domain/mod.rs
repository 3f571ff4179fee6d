//! 도메인 모델.

pub mod bar;
pub mod security;
pub mod signal;

pub use bar::Bar;
pub use security::Security;
pub use signal::{SignalDetection, SIGNAL_TYPE_HAMMER_AFTER_DECLINE};
