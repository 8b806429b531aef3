//! 비동기 로그 쓰기 스케줄러
//!
//! 호출 스레드는 파일 I/O를 기다리지 않습니다. 모든 기록은 전용 워커 스레드 하나의
//! FIFO 큐로 전달되며, 워커만 [`RotatingFileSink`]를 소유하므로 순환, 크기 확인,
//! 기록이 서로 끼어들 수 없습니다.
//!
//! 워커는 단일 스레드 tokio 이벤트 루프이며 두 개의 마감 시각을 관리합니다.
//! - 플러시 마감: 매 기록마다 `flush_delay` 뒤로 다시 설정, 지나면 버퍼 플러시
//! - 닫기 마감: 매 기록마다 `close_delay` 뒤로 다시 설정, 지나면 파일 핸들 닫기
//!
//! 가장 최근 기록이 정한 마감만 유효하므로 연속 기록 중에는 플러시가 한 번으로 모입니다.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::logging::config::LoggingConfig;
use crate::logging::rotation::{RotatingFileSink, Slot};

/// 워커 스레드 이름
const WORKER_THREAD_NAME: &str = "tagged-logger-writer";

/// 워커 명령
#[derive(Debug)]
enum WriteCommand {
    /// 한 줄 기록
    Write {
        line: String,
        submitted_at: std::time::Instant,
    },
    /// 즉시 플러시
    Flush,
    /// 남은 기록을 마치고 종료
    Shutdown,
}

/// 워커 통계 카운터
#[derive(Debug, Default)]
struct StatsCounters {
    writes: AtomicU64,
    timer_flushes: AtomicU64,
    timer_closes: AtomicU64,
    rotations: AtomicU64,
}

/// 스케줄러 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// 처리된 기록 수
    pub writes: u64,
    /// 플러시 마감으로 실행된 플러시 수
    pub timer_flushes: u64,
    /// 닫기 마감으로 실행된 핸들 닫기 수
    pub timer_closes: u64,
    /// 파일 순환 수
    pub rotations: u64,
}

/// 워커에 전달되는 타이머 설정
#[derive(Debug, Clone, Copy)]
struct Delays {
    flush: Duration,
    close: Duration,
}

/// 비동기 쓰기 스케줄러
pub struct WriteScheduler {
    /// 기본 로그 파일 경로
    path: PathBuf,
    /// 명령 전송 채널
    sender: mpsc::UnboundedSender<WriteCommand>,
    /// 워커 스레드 핸들
    worker: Option<JoinHandle<()>>,
    /// 통계
    stats: Arc<StatsCounters>,
}

impl WriteScheduler {
    /// 워커 스레드를 시작합니다. 파일은 첫 기록 시에 열립니다.
    pub fn spawn<P: Into<PathBuf>>(
        path: P,
        config: &LoggingConfig,
        max_file_size: Arc<AtomicU64>,
    ) -> io::Result<Self> {
        let path = path.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(StatsCounters::default());

        let sink = RotatingFileSink::new(
            path.clone(),
            &config.rotation_suffix,
            config.rotation_policy,
            max_file_size,
        );
        let delays = Delays {
            flush: config.flush_delay,
            close: config.close_delay,
        };

        let worker_stats = stats.clone();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || Self::run_worker(receiver, sink, delays, worker_stats))?;

        debug!(
            path = %path.display(),
            flush_delay = ?config.flush_delay,
            close_delay = ?config.close_delay,
            policy = config.rotation_policy.as_str(),
            "로그 쓰기 워커 시작됨"
        );

        Ok(Self {
            path,
            sender,
            worker: Some(worker),
            stats,
        })
    }

    /// 기본 로그 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 한 줄 기록 요청 (논블로킹)
    ///
    /// 워커가 이미 종료되었으면 `false`를 반환합니다.
    pub fn submit(&self, line: String) -> bool {
        self.sender
            .send(WriteCommand::Write {
                line,
                submitted_at: std::time::Instant::now(),
            })
            .is_ok()
    }

    /// 즉시 플러시 요청 (논블로킹)
    pub fn flush_now(&self) -> bool {
        self.sender.send(WriteCommand::Flush).is_ok()
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            writes: self.stats.writes.load(Ordering::Relaxed),
            timer_flushes: self.stats.timer_flushes.load(Ordering::Relaxed),
            timer_closes: self.stats.timer_closes.load(Ordering::Relaxed),
            rotations: self.stats.rotations.load(Ordering::Relaxed),
        }
    }

    /// 종료 요청 (기다리지 않음)
    ///
    /// 이미 큐에 있는 기록은 워커가 마저 처리한 뒤 파일을 닫고 종료합니다.
    pub fn shutdown(mut self) {
        let _ = self.sender.send(WriteCommand::Shutdown);
        // 핸들을 버리면 스레드는 분리된 채로 남은 작업을 마칩니다
        self.worker.take();
    }

    /// 종료 요청 후 워커가 끝날 때까지 대기
    pub fn shutdown_and_wait(mut self) -> SchedulerStats {
        let _ = self.sender.send(WriteCommand::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!(path = %self.path.display(), "로그 쓰기 워커가 비정상 종료됨");
            }
        }
        self.stats()
    }

    fn run_worker(
        receiver: mpsc::UnboundedReceiver<WriteCommand>,
        sink: RotatingFileSink,
        delays: Delays,
        stats: Arc<StatsCounters>,
    ) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "로그 쓰기 워커 런타임 생성 실패");
                return;
            }
        };

        runtime.block_on(Self::worker_loop(receiver, sink, delays, stats));
    }

    /// 백그라운드 워커 루프
    async fn worker_loop(
        mut receiver: mpsc::UnboundedReceiver<WriteCommand>,
        mut sink: RotatingFileSink,
        delays: Delays,
        stats: Arc<StatsCounters>,
    ) {
        let mut flush_at: Option<Instant> = None;
        let mut close_at: Option<Instant> = None;

        loop {
            tokio::select! {
                // 큐에 쌓인 기록을 타이머보다 먼저 처리
                biased;

                cmd = receiver.recv() => {
                    match cmd {
                        Some(WriteCommand::Write { line, submitted_at }) => {
                            sink.append(&line);
                            stats.writes.fetch_add(1, Ordering::Relaxed);
                            stats.rotations.store(sink.rotations(), Ordering::Relaxed);

                            // 가장 최근 기록 기준으로 두 마감을 다시 설정
                            let base = Instant::from_std(submitted_at);
                            flush_at = Some(base + delays.flush);
                            close_at = Some(base + delays.close);
                        }
                        Some(WriteCommand::Flush) => {
                            sink.flush();
                            flush_at = None;
                        }
                        Some(WriteCommand::Shutdown) | None => {
                            sink.close();
                            debug!(path = %sink.slot_path(Slot::Primary).display(), "로그 쓰기 워커 종료");
                            return;
                        }
                    }
                }

                _ = wait_for(flush_at) => {
                    sink.flush();
                    flush_at = None;
                    stats.timer_flushes.fetch_add(1, Ordering::Relaxed);
                }

                _ = wait_for(close_at) => {
                    sink.close();
                    flush_at = None;
                    close_at = None;
                    stats.timer_closes.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

impl Drop for WriteScheduler {
    fn drop(&mut self) {
        // Drop에서는 기다리지 않고 종료 신호만 전송
        if self.worker.take().is_some() {
            let _ = self.sender.send(WriteCommand::Shutdown);
        }
    }
}

/// 마감이 없으면 영원히 대기
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
