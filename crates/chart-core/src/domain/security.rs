//! 종목 마스터 정보.

use serde::{Deserialize, Serialize};

/// 종목 마스터 행.
///
/// 수집 대상 유니버스를 구성하며, 시그널 저장 시 종목명/시장/업종을 보강하는 데 사용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// 종목 코드 (예: "7203")
    pub code: String,
    /// 데이터 소스 심볼 (예: "7203.T")
    pub symbol: String,
    /// 종목명
    pub name: String,
    /// 업종
    pub sector: Option<String>,
    /// 시장 구분
    pub market: Option<String>,
}

impl Security {
    /// 최소 정보로 종목 생성.
    pub fn new(code: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            name: name.into(),
            sector: None,
            market: None,
        }
    }
}
