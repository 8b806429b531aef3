//! 태그 로거 라이브러리
//!
//! 심각도 필터, 호출 위치 태그, printf 스타일 포매터, 두 파일 순환 싱크,
//! 비동기 쓰기 스케줄러로 구성된 로깅 코어입니다.
//!
//! # 아키텍처
//!
//! ```text
//! Logger (호출 스레드)
//! ├── should_emit      (심각도 필터)
//! ├── SiteResolver     (호출 위치 태그)
//! ├── format_message   (메시지 치환)
//! ├── ConsoleSink      (동기 콘솔 출력)
//! └── WriteScheduler   (워커 스레드)
//!     └── RotatingFileSink (두 파일 순환)
//! ```
//!
//! # 사용 예시
//!
//! ```no_run
//! use tagged_logger::{global, Severity};
//!
//! let logger = global();
//! logger.set_minimum_level(Severity::Debug);
//! logger.debug("count=%d", &[&3]).ok();
//! logger.shutdown();
//! ```

pub mod error;
pub mod logging;

pub use error::{FormatError, FormatResult, LoggerError, Result};
pub use logging::{display, global, FormatArg, Logger, LoggingConfig, RotationPolicy, Severity};
