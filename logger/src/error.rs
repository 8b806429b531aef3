//! Logger 에러 정의
//!
//! 설정 오류와 메시지 포맷 오류만 호출자에게 전달됩니다.
//! 파일 I/O 오류는 싱크 내부에서 처리되며 이 타입으로 노출되지 않습니다.

use thiserror::Error;

/// 설정 관련 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggerError {
    /// 최대 파일 크기는 0보다 커야 함
    #[error("최대 로그 파일 크기는 0보다 커야 합니다: {0}")]
    InvalidMaxFileSize(u64),

    /// 환경변수 값을 해석할 수 없음
    #[error("잘못된 설정 값 {key}={value}")]
    InvalidConfig { key: String, value: String },
}

/// 메시지 포맷 에러
///
/// 템플릿과 인자 개수가 맞지 않는 것은 호출자의 프로그래밍 오류이므로
/// 조용히 무시하지 않고 그대로 반환합니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// 템플릿이 요구하는 인자가 없음 (1부터 시작하는 위치)
    #[error("포맷 인자 누락: {position}번째 인자가 필요하지만 {supplied}개만 전달됨")]
    MissingArgument { position: usize, supplied: usize },

    /// 전달된 인자 중 사용되지 않은 인자가 있음
    #[error("사용되지 않은 포맷 인자: {used}개 사용, {supplied}개 전달됨")]
    UnusedArguments { used: usize, supplied: usize },

    /// 지원하지 않는 변환 문자
    #[error("지원하지 않는 포맷 변환: %{0}")]
    UnknownConversion(char),

    /// 플래그, 폭, 정밀도 조합이 변환과 맞지 않음
    #[error("잘못된 포맷 지정자: {specifier}")]
    IllegalSpecifier { specifier: String },

    /// 인자 타입이 변환과 맞지 않음 (예: 문자열에 `%d`)
    #[error("%{conversion} 변환에 맞지 않는 {position}번째 인자")]
    ArgumentMismatch { conversion: char, position: usize },

    /// 템플릿이 `%`로 끝남
    #[error("템플릿이 '%'로 끝납니다")]
    DanglingPercent,
}

pub type Result<T> = std::result::Result<T, LoggerError>;

/// 로그 호출 결과
pub type FormatResult<T = ()> = std::result::Result<T, FormatError>;
