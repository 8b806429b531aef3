//! 태그 로거 데모
//!
//! 환경변수로 전역 로거를 설정하고, 여러 워커에서 로그를 쏟아낸 뒤
//! 파일 기록을 정리하고 종료합니다.

use anyhow::{Context, Result};
use tagged_logger::{global, Logger};
use tracing::{error, info};

mod config;
mod tree;

use config::{validate_config, AppConfig};
use tree::{ForwardingTree, FACADE_MODULE};

/// 한 워커의 반복 기록
fn run_worker(logger: &'static Logger, worker: usize, iterations: u32) {
    logger.log_thread_start();
    for i in 0..iterations {
        if let Err(e) = logger.debug("Smart log: %s #%05d", &[&worker, &i]) {
            error!("로그 포맷 오류: {}", e);
            break;
        }
    }
    logger.log_thread_finish();
}

/// 데모 메인 진입점
///
/// 환경변수:
/// - LOG_LEVEL, LOG_TAG_PREFIX, LOG_FILE_PATH 등: 로거 설정
/// - demo_iterations: 워커 당 기록 수 (기본값: 3000)
/// - demo_workers: 워커 수 (기본값: 2)
#[tokio::main]
async fn main() -> Result<()> {
    // 로깅 설정
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 환경 설정 로드 (전역 로거 생성 전에 .env를 읽어야 함)
    let config = AppConfig::from_env()?;
    validate_config(&config)?;

    let logger = global();
    logger.set_minimum_level(config.logging.minimum_level);
    logger.set_tag_prefix(config.logging.tag_prefix.clone());
    logger.set_debug_override(config.logging.debug_override);
    logger
        .set_max_file_size_bytes(config.logging.max_file_size)
        .context("최대 파일 크기 설정 실패")?;
    logger.set_log_file_path(config.logging.file_path.clone());

    info!("=== 태그 로거 데모 ===");
    info!("로그 파일: {:?}", logger.log_file_path());
    info!("최소 심각도: {}", logger.minimum_level());
    info!("워커: {} x {}", config.workers, config.iterations);
    info!("=====================");

    let tree = ForwardingTree::plant(logger).tag("Tree");
    tree.i("데모 시작");
    tree.d(&format!("파사드 표식 등록: {}", FACADE_MODULE));

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let iterations = config.iterations;
        handles.push(tokio::task::spawn_blocking(move || {
            run_worker(logger, worker, iterations)
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tree.e(&format!("워커 실행 오류: {e}"));
        }
    }

    logger.warn("%d개 워커 완료, 100%% 기록됨", &[&config.workers])?;
    tree.i("데모 종료");

    // 전역 로거는 drop되지 않으므로 직접 정리
    if let Some(stats) = logger.shutdown() {
        info!(
            writes = stats.writes,
            rotations = stats.rotations,
            timer_flushes = stats.timer_flushes,
            "파일 기록 종료"
        );
        if stats.rotations > 0 {
            // 파일 기록은 꺼졌으므로 콘솔에만 출력됨
            tree.w("로그 파일이 순환되어 이전 기록 일부는 -prev 파일에 있습니다");
        }
    }

    Ok(())
}
