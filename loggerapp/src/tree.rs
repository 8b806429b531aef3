//! 전달용 로그 파사드
//!
//! 외부 로깅 라이브러리의 "tree"처럼 메시지를 받아 로거의 외부 진입점으로
//! 넘깁니다. 전달 함수가 `#[track_caller]`이므로 태그에는 파사드를 호출한
//! 위치가 기록됩니다.

use tagged_logger::{Logger, Severity};

/// 파사드 모듈 경로 (로거에 등록하는 표식)
pub const FACADE_MODULE: &str = module_path!();

/// 로거로 전달하는 tree
pub struct ForwardingTree<'a> {
    logger: &'a Logger,
    tag: Option<String>,
}

impl<'a> ForwardingTree<'a> {
    /// 로거에 파사드 표식을 등록하고 tree 생성
    pub fn plant(logger: &'a Logger) -> Self {
        logger.register_facade(FACADE_MODULE);
        logger.register_facade(file!());
        Self { logger, tag: None }
    }

    /// 다음 메시지들에 사용할 태그 지정
    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[track_caller]
    pub fn d(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    #[track_caller]
    pub fn i(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    #[track_caller]
    pub fn w(&self, message: &str) {
        self.log(Severity::Warn, message);
    }

    #[track_caller]
    pub fn e(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    #[track_caller]
    fn log(&self, priority: Severity, message: &str) {
        self.logger
            .log_from_external(priority, self.tag.as_deref(), message);
    }
}
