//! 로깅 설정 관리
//!
//! 로거의 설정 파라미터와 환경변수 로드, 유효성 검증을 담당합니다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LoggerError, Result};
use crate::logging::level::Severity;

/// 기본 태그 접두사
pub const DEFAULT_TAG_PREFIX: &str = "TaggedLogger";

/// 기본 최대 로그 파일 크기 (2MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// 이전 로그 파일 접미사
pub const DEFAULT_ROTATION_SUFFIX: &str = "-prev";

/// 로그 파일 순환 정책
///
/// 어느 쪽이든 디스크에는 최대 두 개의 파일만 남습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// 크기를 넘은 파일을 보조 경로로 이름 변경하고 새 기본 파일에 이어서 기록
    ///
    /// 보조 파일은 항상 직전 로그 전체를 담고 있습니다.
    #[default]
    RenameSwap,
    /// 활성 슬롯을 번갈아 바꾸고, 새로 활성화된 파일은 비운 뒤 기록
    ///
    /// 비활성 파일은 직전 슬롯의 내용을 유지합니다.
    TruncateOnReuse,
}

impl RotationPolicy {
    /// 정책을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationPolicy::RenameSwap => "rename_swap",
            RotationPolicy::TruncateOnReuse => "truncate_on_reuse",
        }
    }
}

impl FromStr for RotationPolicy {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "rename_swap" | "rename" => Ok(RotationPolicy::RenameSwap),
            "truncate_on_reuse" | "truncate" => Ok(RotationPolicy::TruncateOnReuse),
            _ => Err(()),
        }
    }
}

/// 로깅 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 최소 출력 심각도 (기본값: VERBOSE)
    pub minimum_level: Severity,

    /// 태그 접두사 (기본값: "TaggedLogger")
    pub tag_prefix: String,

    /// 로그 파일 경로 (기본값: None, 파일 기록 안 함)
    pub file_path: Option<PathBuf>,

    /// 최대 로그 파일 크기 (바이트 단위, 기본값: 2MB)
    pub max_file_size: u64,

    /// 최소 심각도를 무시하고 모두 출력 (기본값: false)
    pub debug_override: bool,

    /// 마지막 기록 후 플러시까지 대기 시간 (기본값: 1초)
    pub flush_delay: Duration,

    /// 마지막 기록 후 파일 핸들을 닫기까지 대기 시간 (기본값: 60초)
    pub close_delay: Duration,

    /// 순환 정책 (기본값: RenameSwap)
    pub rotation_policy: RotationPolicy,

    /// 보조 파일 접미사 (기본값: "-prev")
    pub rotation_suffix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            minimum_level: Severity::Verbose,
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            file_path: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            debug_override: false,
            flush_delay: Duration::from_secs(1),
            close_delay: Duration::from_secs(60),
            rotation_policy: RotationPolicy::RenameSwap,
            rotation_suffix: DEFAULT_ROTATION_SUFFIX.to_string(),
        }
    }
}

impl LoggingConfig {
    /// 환경변수에서 설정 로드
    ///
    /// | 변수 | 필드 |
    /// |------|------|
    /// | `LOG_LEVEL` | `minimum_level` |
    /// | `LOG_TAG_PREFIX` | `tag_prefix` |
    /// | `LOG_FILE_PATH` | `file_path` (빈 값이면 None) |
    /// | `LOG_MAX_FILE_SIZE` | `max_file_size` |
    /// | `LOG_DEBUG_MODE` | `debug_override` |
    /// | `LOG_FLUSH_DELAY_MS` | `flush_delay` |
    /// | `LOG_CLOSE_DELAY_SECS` | `close_delay` |
    /// | `LOG_ROTATION_POLICY` | `rotation_policy` |
    /// | `LOG_ROTATION_SUFFIX` | `rotation_suffix` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = parse_var::<Severity, _>(&lookup, "LOG_LEVEL")? {
            config.minimum_level = level;
        }

        if let Some(prefix) = lookup("LOG_TAG_PREFIX") {
            config.tag_prefix = prefix;
        }

        if let Some(path) = lookup("LOG_FILE_PATH") {
            let path = path.trim();
            config.file_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }

        if let Some(size) = parse_var::<u64, _>(&lookup, "LOG_MAX_FILE_SIZE")? {
            config.max_file_size = size;
        }

        if let Some(val) = lookup("LOG_DEBUG_MODE") {
            config.debug_override = val.trim().to_lowercase() == "true";
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "LOG_FLUSH_DELAY_MS")? {
            config.flush_delay = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "LOG_CLOSE_DELAY_SECS")? {
            config.close_delay = Duration::from_secs(secs);
        }

        if let Some(policy) = parse_var::<RotationPolicy, _>(&lookup, "LOG_ROTATION_POLICY")? {
            config.rotation_policy = policy;
        }

        if let Some(suffix) = lookup("LOG_ROTATION_SUFFIX") {
            config.rotation_suffix = suffix;
        }

        config.validate()?;
        Ok(config)
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(LoggerError::InvalidMaxFileSize(self.max_file_size));
        }

        if self.rotation_suffix.is_empty() {
            return Err(LoggerError::InvalidConfig {
                key: "rotation_suffix".to_string(),
                value: String::new(),
            });
        }

        if self.flush_delay.is_zero() {
            return Err(LoggerError::InvalidConfig {
                key: "flush_delay".to_string(),
                value: format!("{:?}", self.flush_delay),
            });
        }

        Ok(())
    }

    /// 보조 (이전) 로그 파일 경로
    pub fn secondary_path(&self) -> Option<PathBuf> {
        self.file_path
            .as_ref()
            .map(|path| secondary_path_for(path, &self.rotation_suffix))
    }
}

/// 기본 경로에 접미사를 붙인 보조 파일 경로
pub fn secondary_path_for(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(LoggerError::InvalidConfig {
                key: key.to_string(),
                value: raw,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.minimum_level, Severity::Verbose);
        assert_eq!(config.tag_prefix, "TaggedLogger");
        assert!(config.file_path.is_none());
        assert_eq!(config.max_file_size, 2 * 1024 * 1024);
        assert!(!config.debug_override);
        assert_eq!(config.flush_delay, Duration::from_secs(1));
        assert_eq!(config.close_delay, Duration::from_secs(60));
        assert_eq!(config.rotation_policy, RotationPolicy::RenameSwap);
        assert_eq!(config.rotation_suffix, "-prev");
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = LoggingConfig::from_lookup(lookup_from(&[
            ("LOG_LEVEL", "warn"),
            ("LOG_TAG_PREFIX", "MyApplication"),
            ("LOG_FILE_PATH", "/tmp/dev/log"),
            ("LOG_MAX_FILE_SIZE", "1024"),
            ("LOG_DEBUG_MODE", "TRUE"),
            ("LOG_FLUSH_DELAY_MS", "250"),
            ("LOG_CLOSE_DELAY_SECS", "5"),
            ("LOG_ROTATION_POLICY", "truncate-on-reuse"),
            ("LOG_ROTATION_SUFFIX", ".old"),
        ]))
        .unwrap();

        assert_eq!(config.minimum_level, Severity::Warn);
        assert_eq!(config.tag_prefix, "MyApplication");
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/dev/log")));
        assert_eq!(config.max_file_size, 1024);
        assert!(config.debug_override);
        assert_eq!(config.flush_delay, Duration::from_millis(250));
        assert_eq!(config.close_delay, Duration::from_secs(5));
        assert_eq!(config.rotation_policy, RotationPolicy::TruncateOnReuse);
        assert_eq!(config.secondary_path(), Some(PathBuf::from("/tmp/dev/log.old")));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = LoggingConfig::from_lookup(lookup_from(&[("LOG_MAX_FILE_SIZE", "big")]))
            .unwrap_err();
        assert_eq!(
            err,
            LoggerError::InvalidConfig {
                key: "LOG_MAX_FILE_SIZE".to_string(),
                value: "big".to_string()
            }
        );

        let err = LoggingConfig::from_lookup(lookup_from(&[("LOG_MAX_FILE_SIZE", "0")]))
            .unwrap_err();
        assert_eq!(err, LoggerError::InvalidMaxFileSize(0));

        assert!(LoggingConfig::from_lookup(lookup_from(&[("LOG_LEVEL", "loud")])).is_err());
    }

    #[test]
    fn test_empty_file_path_disables_file() {
        let config = LoggingConfig::from_lookup(lookup_from(&[("LOG_FILE_PATH", "  ")])).unwrap();
        assert!(config.file_path.is_none());
        assert!(config.secondary_path().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.max_file_size = 0;
        assert!(config.validate().is_err());

        config.max_file_size = 1024;
        config.rotation_suffix.clear();
        assert!(config.validate().is_err());

        config.rotation_suffix = "-prev".to_string();
        config.flush_delay = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: LoggingConfig = serde_json::from_str(
            r#"{"minimum_level":"error","tag_prefix":"Svc","rotation_policy":"truncate_on_reuse"}"#,
        )
        .unwrap();
        assert_eq!(config.minimum_level, Severity::Error);
        assert_eq!(config.tag_prefix, "Svc");
        assert_eq!(config.rotation_policy, RotationPolicy::TruncateOnReuse);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }
}
