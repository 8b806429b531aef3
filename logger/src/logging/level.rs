//! 로그 심각도와 필터
//!
//! 심각도는 VERBOSE < DEBUG < INFO < WARN < ERROR < ASSERT 순서로 정렬되며,
//! 이 순서가 필터 비교의 기준이 됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 로그 심각도 열거형
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    /// 상세한 추적 정보
    Verbose = 2,
    /// 디버깅 정보
    Debug = 3,
    /// 일반 정보
    Info = 4,
    /// 경고 상황
    Warn = 5,
    /// 오류 상황
    Error = 6,
    /// 발생해서는 안 되는 상황 (`fatal`)
    Assert = 7,
}

impl Severity {
    /// 낮은 순서대로 나열된 모든 심각도
    pub const ALL: [Severity; 6] = [
        Severity::Verbose,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Assert,
    ];

    /// 로그 파일에 기록되는 한 글자 약어
    pub fn abbr(&self) -> &'static str {
        match self {
            Severity::Verbose => "V",
            Severity::Debug => "D",
            Severity::Info => "I",
            Severity::Warn => "W",
            Severity::Error => "E",
            Severity::Assert => "X",
        }
    }

    /// 심각도를 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Assert => "ASSERT",
        }
    }

    /// 원자 변수 저장용 정수 값
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    /// 원자 변수에서 읽은 값을 복원. 범위 밖 값은 가장 가까운 끝 값으로 처리
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0..=2 => Severity::Verbose,
            3 => Severity::Debug,
            4 => Severity::Info,
            5 => Severity::Warn,
            6 => Severity::Error,
            _ => Severity::Assert,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "V" | "VERBOSE" | "TRACE" => Ok(Severity::Verbose),
            "D" | "DEBUG" => Ok(Severity::Debug),
            "I" | "INFO" => Ok(Severity::Info),
            "W" | "WARN" | "WARNING" => Ok(Severity::Warn),
            "E" | "ERROR" => Ok(Severity::Error),
            "X" | "A" | "ASSERT" | "FATAL" | "WTF" => Ok(Severity::Assert),
            _ => Err(()),
        }
    }
}

impl From<Severity> for tracing::Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Verbose => tracing::Level::TRACE,
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error | Severity::Assert => tracing::Level::ERROR,
        }
    }
}

/// 이벤트를 출력할지 결정
///
/// `priority >= minimum` 이거나 디버그 오버라이드가 켜져 있으면 `true`.
/// 부수 효과가 없는 순수 함수입니다.
pub fn should_emit(priority: Severity, minimum: Severity, debug_override: bool) -> bool {
    debug_override || priority >= minimum
}
