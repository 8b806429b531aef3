//! 로거 컨텍스트
//!
//! 필터, 호출 위치 해석기, 포매터, 콘솔 싱크, 쓰기 스케줄러를 하나로 묶는
//! 메인 객체입니다. 호출 스레드가 건드리는 공유 상태는 설정 값뿐이며 모두
//! 원자 변수 또는 짧게 잡는 잠금으로 보호됩니다 (마지막 쓰기가 이김).

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{FormatResult, LoggerError, Result};
use crate::logging::{
    args::FormatArg,
    config::LoggingConfig,
    console::{ConsoleSink, StderrConsole},
    formatter::LogEvent,
    level::{should_emit, Severity},
    site::SiteResolver,
    writer::{SchedulerStats, WriteScheduler},
};

/// 프로세스 전역 로거
static GLOBAL: Lazy<Logger> = Lazy::new(|| match LoggingConfig::from_env() {
    Ok(config) => Logger::from_parts(config, Arc::new(StderrConsole)),
    Err(e) => {
        warn!(error = %e, "로깅 환경 변수가 잘못되어 기본 설정을 사용합니다");
        Logger::with_defaults()
    }
});

/// 프로세스 전역 로거 반환
///
/// 처음 호출될 때 환경 변수 설정과 표준 에러 콘솔로 생성됩니다.
/// `.env` 파일을 쓰는 경우 첫 호출 전에 로드해야 합니다.
pub fn global() -> &'static Logger {
    &GLOBAL
}

/// 로거
pub struct Logger {
    /// 최소 출력 심각도
    minimum_level: AtomicU8,
    /// 디버그 오버라이드
    debug_override: AtomicBool,
    /// 태그 접두사
    tag_prefix: RwLock<String>,
    /// 최대 파일 크기 (워커의 싱크와 공유)
    max_file_size: Arc<AtomicU64>,
    /// 스케줄러 생성 시 사용하는 파일 설정 (지연 시간, 순환 정책, 접미사)
    file_settings: LoggingConfig,
    /// 파일 경로가 설정된 동안만 존재하는 쓰기 스케줄러
    ///
    /// 로그 호출은 읽기 잠금만 잡고, 교체는 쓰기 잠금으로 짧게 수행합니다.
    scheduler: RwLock<Option<WriteScheduler>>,
    /// 파일 경로 변경 직렬화
    path_change: Mutex<()>,
    /// 호출 위치 해석기
    resolver: SiteResolver,
    /// 콘솔 싱크
    console: Arc<dyn ConsoleSink>,
}

impl Logger {
    /// 설정으로 로거 생성 (표준 에러 콘솔 사용)
    pub fn new(config: LoggingConfig) -> Result<Self> {
        Self::with_console(config, Arc::new(StderrConsole))
    }

    /// 설정과 콘솔 싱크로 로거 생성
    pub fn with_console(config: LoggingConfig, console: Arc<dyn ConsoleSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, console))
    }

    /// 기본 설정으로 로거 생성
    pub fn with_defaults() -> Self {
        Self::from_parts(LoggingConfig::default(), Arc::new(StderrConsole))
    }

    fn from_parts(config: LoggingConfig, console: Arc<dyn ConsoleSink>) -> Self {
        let file_path = config.file_path.clone();
        let logger = Self {
            minimum_level: AtomicU8::new(config.minimum_level.as_u8()),
            debug_override: AtomicBool::new(config.debug_override),
            tag_prefix: RwLock::new(config.tag_prefix.clone()),
            max_file_size: Arc::new(AtomicU64::new(config.max_file_size)),
            file_settings: config,
            scheduler: RwLock::new(None),
            path_change: Mutex::new(()),
            resolver: SiteResolver::new(),
            console,
        };
        logger.set_log_file_path(file_path);
        logger
    }

    // ---- 설정 ----

    /// 최소 출력 심각도 설정
    pub fn set_minimum_level(&self, level: Severity) {
        self.minimum_level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// 최소 출력 심각도
    pub fn minimum_level(&self) -> Severity {
        Severity::from_u8(self.minimum_level.load(Ordering::Relaxed))
    }

    /// 디버그 오버라이드 설정. 켜면 최소 심각도와 관계없이 모두 출력합니다.
    pub fn set_debug_override(&self, enabled: bool) {
        self.debug_override.store(enabled, Ordering::Relaxed);
    }

    /// 디버그 오버라이드 여부
    pub fn debug_override(&self) -> bool {
        self.debug_override.load(Ordering::Relaxed)
    }

    /// 태그 접두사 설정
    pub fn set_tag_prefix<S: Into<String>>(&self, prefix: S) {
        *self.tag_prefix.write() = prefix.into();
    }

    /// 태그 접두사
    pub fn tag_prefix(&self) -> String {
        self.tag_prefix.read().clone()
    }

    /// 최대 로그 파일 크기 설정
    ///
    /// 0이면 거부하고 이전 값을 유지합니다.
    pub fn set_max_file_size_bytes(&self, bytes: u64) -> Result<()> {
        if bytes == 0 {
            return Err(LoggerError::InvalidMaxFileSize(bytes));
        }
        self.max_file_size.store(bytes, Ordering::Relaxed);
        Ok(())
    }

    /// 최대 로그 파일 크기
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size.load(Ordering::Relaxed)
    }

    /// 로그 파일 경로 설정
    ///
    /// `None`이면 파일 기록을 끄고 스케줄러를 정리합니다. 새 경로를 설정하면 기존
    /// 스케줄러를 정리하고 새로 시작합니다. 어느 경우에도 호출자는 기다리지 않습니다.
    pub fn set_log_file_path(&self, path: Option<PathBuf>) {
        let _guard = self.path_change.lock();

        let current = self.scheduler.read().as_ref().map(|s| s.path().to_path_buf());
        if current.is_some() && current == path {
            return;
        }

        // 워커 스레드 생성은 잠금 밖에서 수행
        let replacement = path.and_then(|path| {
            let settings = &self.file_settings;
            match WriteScheduler::spawn(path.clone(), settings, self.max_file_size.clone()) {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "로그 쓰기 워커 시작 실패, 파일 기록이 비활성화됨"
                    );
                    None
                }
            }
        });

        let old = std::mem::replace(&mut *self.scheduler.write(), replacement);
        if let Some(old) = old {
            debug!(path = %old.path().display(), "로그 파일 기록 중지");
            old.shutdown();
        }
    }

    /// 현재 로그 파일 경로
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.scheduler.read().as_ref().map(|s| s.path().to_path_buf())
    }

    /// 쓰기 스케줄러 통계
    pub fn scheduler_stats(&self) -> Option<SchedulerStats> {
        self.scheduler.read().as_ref().map(|s| s.stats())
    }

    /// 버퍼된 파일 기록을 즉시 플러시하도록 요청 (논블로킹)
    pub fn flush(&self) {
        if let Some(scheduler) = self.scheduler.read().as_ref() {
            scheduler.flush_now();
        }
    }

    /// 파일 기록을 끄고 남은 기록이 모두 파일에 쓰일 때까지 대기
    ///
    /// 프로세스 종료 직전에 호출합니다. 전역 로거는 drop되지 않으므로
    /// 호출하지 않으면 버퍼에 남은 줄을 잃을 수 있습니다.
    pub fn shutdown(&self) -> Option<SchedulerStats> {
        let _guard = self.path_change.lock();
        let scheduler = self.scheduler.write().take();
        scheduler.map(WriteScheduler::shutdown_and_wait)
    }

    /// 파사드 모듈 경로 또는 파일 경로 등록
    pub fn register_facade<S: Into<String>>(&self, marker: S) {
        self.resolver.register_facade(marker);
    }

    /// 호출 위치 해석기
    pub fn resolver(&self) -> &SiteResolver {
        &self.resolver
    }

    /// 해당 심각도가 출력 대상인지 확인
    pub fn is_loggable(&self, severity: Severity) -> bool {
        should_emit(severity, self.minimum_level(), self.debug_override())
    }

    // ---- 레벨별 로그 ----

    /// VERBOSE 로그
    #[track_caller]
    pub fn verbose(&self, template: &str, args: &[&dyn FormatArg]) -> FormatResult {
        self.log_at_caller(Severity::Verbose, template, args)
    }

    /// DEBUG 로그
    #[track_caller]
    pub fn debug(&self, template: &str, args: &[&dyn FormatArg]) -> FormatResult {
        self.log_at_caller(Severity::Debug, template, args)
    }

    /// INFO 로그
    #[track_caller]
    pub fn info(&self, template: &str, args: &[&dyn FormatArg]) -> FormatResult {
        self.log_at_caller(Severity::Info, template, args)
    }

    /// WARN 로그
    #[track_caller]
    pub fn warn(&self, template: &str, args: &[&dyn FormatArg]) -> FormatResult {
        self.log_at_caller(Severity::Warn, template, args)
    }

    /// ERROR 로그
    #[track_caller]
    pub fn error(&self, template: &str, args: &[&dyn FormatArg]) -> FormatResult {
        self.log_at_caller(Severity::Error, template, args)
    }

    /// ASSERT 로그
    #[track_caller]
    pub fn fatal(&self, template: &str, args: &[&dyn FormatArg]) -> FormatResult {
        self.log_at_caller(Severity::Assert, template, args)
    }

    /// 지정한 태그로 VERBOSE 로그
    pub fn verbose_with_tag(
        &self,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        self.log(Severity::Verbose, tag, template, args)
    }

    /// 지정한 태그로 DEBUG 로그
    pub fn debug_with_tag(
        &self,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        self.log(Severity::Debug, tag, template, args)
    }

    /// 지정한 태그로 INFO 로그
    pub fn info_with_tag(
        &self,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        self.log(Severity::Info, tag, template, args)
    }

    /// 지정한 태그로 WARN 로그
    pub fn warn_with_tag(
        &self,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        self.log(Severity::Warn, tag, template, args)
    }

    /// 지정한 태그로 ERROR 로그
    pub fn error_with_tag(
        &self,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        self.log(Severity::Error, tag, template, args)
    }

    /// 지정한 태그로 ASSERT 로그
    pub fn fatal_with_tag(
        &self,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        self.log(Severity::Assert, tag, template, args)
    }

    /// 외부 로그 파사드용 진입점
    ///
    /// `custom_tag`가 없거나 비어 있으면 태그 접두사를 사용합니다. 호출 위치는 등록된
    /// 파사드 프레임을 건너뛰어 찾으며, 찾지 못하면 위치 조각 없이 기록됩니다.
    /// 파사드의 전달 함수도 `#[track_caller]`이면 실제 호출 위치가 그대로 전달됩니다.
    #[track_caller]
    pub fn log_from_external(&self, priority: Severity, custom_tag: Option<&str>, message: &str) {
        if !self.is_loggable(priority) {
            return;
        }
        let base = match custom_tag {
            Some(tag) if !tag.is_empty() => tag.to_string(),
            _ => self.tag_prefix(),
        };
        let tag = format!("{}|{}", base, self.resolver.caller_tag_bypassing_facades());
        // 인자가 없으므로 포맷 오류가 날 수 없음
        let _ = self.log(priority, &tag, message, &[]);
    }

    /// 스레드 시작 표시 (DEBUG)
    #[track_caller]
    pub fn log_thread_start(&self) {
        let name = current_thread_name();
        let _ = self.log_at_caller(
            Severity::Debug,
            ">>>>>>>> %s start running >>>>>>>>",
            &[&name],
        );
    }

    /// 스레드 종료 표시 (DEBUG)
    #[track_caller]
    pub fn log_thread_finish(&self) {
        let name = current_thread_name();
        let _ = self.log_at_caller(
            Severity::Debug,
            "<<<<<<<< %s finished running <<<<<<<<",
            &[&name],
        );
    }

    /// `<접두사>|.(파일:줄)` 형식의 호출 위치 태그
    #[track_caller]
    pub fn caller_tag(&self) -> String {
        format!("{}|{}", self.tag_prefix(), self.resolver.caller_tag())
    }

    #[track_caller]
    fn log_at_caller(
        &self,
        severity: Severity,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        if !self.is_loggable(severity) {
            return Ok(());
        }
        let tag = self.caller_tag();
        self.log(severity, &tag, template, args)
    }

    fn log(
        &self,
        severity: Severity,
        tag: &str,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> FormatResult {
        if !self.is_loggable(severity) {
            return Ok(());
        }

        let event = LogEvent::new(severity, tag.to_string(), template, args)?;
        self.console.write(event.severity, &event.tag, &event.message);

        if let Some(scheduler) = self.scheduler.read().as_ref() {
            scheduler.submit(event.to_line());
        }
        Ok(())
    }
}

fn current_thread_name() -> String {
    let thread = std::thread::current();
    thread
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", thread.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::logging::console::MemoryConsole;

    fn logger_with_console() -> (Logger, MemoryConsole) {
        let console = MemoryConsole::new();
        let config = LoggingConfig {
            tag_prefix: "Test".to_string(),
            ..Default::default()
        };
        let logger = Logger::with_console(config, Arc::new(console.clone())).unwrap();
        (logger, console)
    }

    #[test]
    fn test_leveled_call_tags_call_site() {
        let (logger, console) = logger_with_console();

        let line = line!() + 1;
        logger.info("Smart log: %s", &[&"MainActivity"]).unwrap();

        let lines = console.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].severity, Severity::Info);
        assert_eq!(lines[0].tag, format!("Test|.(system.rs:{line})"));
        assert_eq!(lines[0].message, "Smart log: MainActivity");
    }

    #[test]
    fn test_with_tag_uses_tag_verbatim() {
        let (logger, console) = logger_with_console();
        logger.warn_with_tag("Custom", "value=%d", &[&42]).unwrap();

        let lines = console.lines();
        assert_eq!(lines[0].tag, "Custom");
        assert_eq!(lines[0].message, "value=42");
    }

    #[test]
    fn test_minimum_level_filters() {
        let (logger, console) = logger_with_console();
        logger.set_minimum_level(Severity::Warn);
        assert_eq!(logger.minimum_level(), Severity::Warn);

        logger.verbose("v", &[]).unwrap();
        logger.debug("d", &[]).unwrap();
        logger.info("i", &[]).unwrap();
        logger.warn("w", &[]).unwrap();
        logger.error("e", &[]).unwrap();
        logger.fatal("x", &[]).unwrap();

        let severities: Vec<Severity> = console.lines().iter().map(|l| l.severity).collect();
        assert_eq!(severities, vec![Severity::Warn, Severity::Error, Severity::Assert]);
    }

    #[test]
    fn test_debug_override_bypasses_minimum() {
        let (logger, console) = logger_with_console();
        logger.set_minimum_level(Severity::Assert);
        logger.set_debug_override(true);

        logger.verbose("still printed", &[]).unwrap();
        assert_eq!(console.len(), 1);
    }

    #[test]
    fn test_format_error_is_returned() {
        let (logger, console) = logger_with_console();
        let err = logger.info("%s %s", &[&1]).unwrap_err();
        assert_eq!(err, FormatError::MissingArgument { position: 2, supplied: 1 });
        assert!(console.is_empty());
    }

    #[test]
    fn test_printf_specifiers_reach_console() {
        let (logger, console) = logger_with_console();
        logger.info("took %.2f ms", &[&1.5]).unwrap();
        logger.debug("[%5d] id=%#x %-6s|", &[&42, &255, &"ok"]).unwrap();

        let lines = console.lines();
        assert_eq!(lines[0].message, "took 1.50 ms");
        assert_eq!(lines[1].message, "[   42] id=0xff ok    |");
    }

    #[test]
    fn test_filtered_call_skips_formatting() {
        let (logger, _console) = logger_with_console();
        logger.set_minimum_level(Severity::Error);
        assert!(logger.info("%s %s", &[&1]).is_ok());
    }

    #[test]
    fn test_external_uses_custom_tag_or_prefix() {
        let (logger, console) = logger_with_console();

        let line = line!() + 1;
        logger.log_from_external(Severity::Error, Some("Timber"), "from facade");
        logger.log_from_external(Severity::Info, None, "no tag");
        logger.log_from_external(Severity::Info, Some(""), "empty tag");

        let lines = console.lines();
        assert_eq!(lines[0].tag, format!("Timber|.(system.rs:{line})"));
        assert!(lines[1].tag.starts_with("Test|.(system.rs:"));
        assert!(lines[2].tag.starts_with("Test|"));
        assert_eq!(lines[0].message, "from facade");
    }

    #[test]
    fn test_external_inside_facade_has_empty_site() {
        let (logger, console) = logger_with_console();
        logger.register_facade("src/logging/system.rs");

        logger.log_from_external(Severity::Warn, Some("Facade"), "100% literal");
        let lines = console.lines();
        assert_eq!(lines[0].tag, "Facade|");
        assert_eq!(lines[0].message, "100% literal");
    }

    #[test]
    fn test_external_respects_filter() {
        let (logger, console) = logger_with_console();
        logger.set_minimum_level(Severity::Warn);
        logger.log_from_external(Severity::Debug, None, "dropped");
        assert!(console.is_empty());
    }

    #[test]
    fn test_tag_prefix_is_idempotent() {
        let (logger, _console) = logger_with_console();
        let tag_at = |logger: &Logger| logger.caller_tag();

        logger.set_tag_prefix("App");
        let first = tag_at(&logger);
        logger.set_tag_prefix("App");
        let second = tag_at(&logger);
        assert_eq!(first, second);
        assert!(first.starts_with("App|.(system.rs:"));
    }

    #[test]
    fn test_invalid_max_size_keeps_previous() {
        let (logger, _console) = logger_with_console();
        logger.set_max_file_size_bytes(4096).unwrap();
        assert_eq!(
            logger.set_max_file_size_bytes(0),
            Err(LoggerError::InvalidMaxFileSize(0))
        );
        assert_eq!(logger.max_file_size_bytes(), 4096);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LoggingConfig {
            max_file_size: 0,
            ..Default::default()
        };
        assert!(Logger::new(config).is_err());
    }

    #[test]
    fn test_thread_markers() {
        let (logger, console) = logger_with_console();
        std::thread::Builder::new()
            .name("worker-1".to_string())
            .spawn(move || {
                logger.log_thread_start();
                logger.log_thread_finish();
            })
            .unwrap()
            .join()
            .unwrap();

        let lines = console.lines();
        assert_eq!(lines[0].message, ">>>>>>>> worker-1 start running >>>>>>>>");
        assert_eq!(lines[1].message, "<<<<<<<< worker-1 finished running <<<<<<<<");
        assert_eq!(lines[0].severity, Severity::Debug);
    }

    #[test]
    fn test_log_calls_during_path_switch() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (logger, console) = logger_with_console();
        let logger = Arc::new(logger);

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let logger = logger.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        logger.info("thread %d line %d", &[&t, &i]).unwrap();
                    }
                })
            })
            .collect();

        for round in 0..10 {
            let path = temp_dir.path().join(format!("switch-{round}.log"));
            logger.set_log_file_path(Some(path.clone()));
            assert_eq!(logger.log_file_path(), Some(path));
        }
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(console.len(), 800);
        assert!(logger.shutdown().is_some());
        assert!(logger.log_file_path().is_none());
    }

    #[test]
    fn test_global_is_single_instance() {
        assert!(std::ptr::eq(global(), global()));
    }
}
