//! 콘솔 출력 싱크
//!
//! 호스트 환경이 제공하는 `write(심각도, 태그, 메시지)` 기본 연산을 추상화합니다.
//! 콘솔 출력은 호출 스레드에서 동기적으로 수행됩니다.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

use crate::logging::level::Severity;

/// 콘솔 싱크 트레이트
pub trait ConsoleSink: Send + Sync {
    /// 한 줄 출력
    fn write(&self, severity: Severity, tag: &str, message: &str);
}

/// 표준 에러로 `V/태그: 메시지` 형식을 출력하는 기본 싱크
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrConsole;

impl ConsoleSink for StderrConsole {
    fn write(&self, severity: Severity, tag: &str, message: &str) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // 여러 줄 메시지는 줄마다 접두사를 붙임
        for line in message.split('\n') {
            let _ = writeln!(handle, "{}/{}: {}", severity.abbr(), tag, line);
        }
    }
}

/// `tracing` 이벤트로 전달하는 싱크
///
/// 호스트가 이미 `tracing-subscriber`를 설치한 경우에 사용합니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn write(&self, severity: Severity, tag: &str, message: &str) {
        match severity {
            Severity::Verbose => tracing::trace!(tag = tag, "{}", message),
            Severity::Debug => tracing::debug!(tag = tag, "{}", message),
            Severity::Info => tracing::info!(tag = tag, "{}", message),
            Severity::Warn => tracing::warn!(tag = tag, "{}", message),
            Severity::Error => tracing::error!(tag = tag, "{}", message),
            Severity::Assert => tracing::error!(tag = tag, fatal = true, "{}", message),
        }
    }
}

/// 콘솔에 출력된 한 줄 (테스트용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub severity: Severity,
    pub tag: String,
    pub message: String,
}

/// 메모리 내 콘솔 싱크 (테스트용)
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    /// 출력된 줄들
    lines: Arc<Mutex<Vec<ConsoleLine>>>,
}

impl MemoryConsole {
    /// 새 메모리 내 싱크 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 출력 줄 반환
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.lock().clone()
    }

    /// 출력 줄 개수 반환
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// 출력이 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// 출력 지우기
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ConsoleSink for MemoryConsole {
    fn write(&self, severity: Severity, tag: &str, message: &str) {
        self.lines.lock().push(ConsoleLine {
            severity,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}
