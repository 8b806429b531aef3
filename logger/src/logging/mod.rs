//! 태그 로깅 시스템
//!
//! 호출 위치가 태그에 자동으로 붙는 경량 로거입니다.
//!
//! # 주요 기능
//! - **심각도 필터**: 최소 심각도 미만은 포맷하지 않고 버림
//! - **호출 위치 태그**: `<접두사>|.(파일:줄)` 형식, 파사드 프레임 건너뛰기 지원
//! - **printf 스타일 메시지**: `%s`, `%05d`, `%.2f`, `%#x`, `%2$s`, `%%`, `%n` 등
//! - **두 파일 순환**: 활성 파일과 `-prev` 파일 두 개로 디스크 사용량 제한
//! - **비동기 기록**: 전용 워커 스레드, 1초 지연 플러시, 60초 유휴 닫기
//!
//! # 사용 예시
//! ```no_run
//! use tagged_logger::logging::{Logger, LoggingConfig, Severity};
//!
//! let logger = Logger::new(LoggingConfig::default())?;
//! logger.set_minimum_level(Severity::Verbose);
//! logger.set_tag_prefix("MyApplication");
//! logger.set_log_file_path(Some("./logs/app.log".into()));
//!
//! logger.info("Smart log: %s", &[&"MainActivity"])?;
//! logger.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod args;
pub mod config;
pub mod console;
pub mod formatter;
pub mod level;
pub mod rotation;
pub mod site;
pub mod system;
pub mod writer;

pub use args::{display, ArgValue, DisplayArg, FormatArg};
pub use config::{LoggingConfig, RotationPolicy};
pub use console::{ConsoleLine, ConsoleSink, MemoryConsole, StderrConsole, TracingConsole};
pub use formatter::{format_message, LogEvent};
pub use level::{should_emit, Severity};
pub use rotation::{RotatingFileSink, Slot};
pub use site::{Frame, SiteResolver, CORE_FRAME_DEPTH};
pub use system::{global, Logger};
pub use writer::{SchedulerStats, WriteScheduler};
