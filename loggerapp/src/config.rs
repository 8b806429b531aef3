//! 데모 앱 설정

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tagged_logger::LoggingConfig;
use tracing::{info, warn};

/// 파일 경로가 지정되지 않았을 때 사용하는 로그 파일
const DEFAULT_LOG_FILE: &str = "./logs/loggerapp.log";

/// 데모 앱 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 워커 당 반복 횟수
    pub iterations: u32,
    /// 워커 수
    pub workers: usize,
    /// 로거 설정
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// 로깅 관련 키는 `LoggingConfig::from_env`가 읽습니다.
    pub fn from_env() -> Result<Self> {
        Self::load_env_file();

        let mut logging = LoggingConfig::from_env().context("로깅 설정 로드 실패")?;
        if logging.file_path.is_none() {
            logging.file_path = Some(PathBuf::from(DEFAULT_LOG_FILE));
        }

        let config = Self {
            iterations: std::env::var("demo_iterations")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            workers: std::env::var("demo_workers")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            logging,
        };

        info!("데모 앱 설정 로드 완료: {:?}", config);
        Ok(config)
    }

    fn load_env_file() {
        // 여러 위치에서 .env 파일 찾기
        let env_paths = vec![".env", "../.env"];

        let mut loaded = false;
        for path in env_paths {
            if Path::new(path).exists() && dotenv::from_filename(path).is_ok() {
                info!(".env 파일 로드 성공: {}", path);
                loaded = true;
                break;
            }
        }

        if !loaded {
            warn!(".env 파일을 찾을 수 없습니다. 기본값과 시스템 환경변수를 사용합니다.");
        }
    }
}

/// 설정 검증
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.workers == 0 {
        return Err(anyhow::anyhow!("워커 수는 1 이상이어야 합니다"));
    }

    config.logging.validate().context("로깅 설정 검증 실패")?;
    Ok(())
}
