//! 로그 파일 순환 싱크
//!
//! 기본 파일(`path`)과 보조 파일(`path` + 접미사) 두 개만 사용하며,
//! 활성 파일이 최대 크기에 도달하면 순환합니다.
//!
//! 이 싱크는 쓰기 스케줄러의 워커 스레드만 소유하므로 내부에 잠금이 없습니다.
//! 모든 I/O 오류는 여기서 처리되고 호출자에게 전파되지 않습니다.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::logging::config::{secondary_path_for, RotationPolicy};

/// 파일 슬롯
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `path`
    Primary,
    /// `path` + 순환 접미사
    Secondary,
}

impl Slot {
    /// 반대쪽 슬롯
    pub fn other(self) -> Self {
        match self {
            Slot::Primary => Slot::Secondary,
            Slot::Secondary => Slot::Primary,
        }
    }
}

/// 크기 제한 순환 파일 싱크
pub struct RotatingFileSink {
    /// 기본 파일 경로
    primary: PathBuf,
    /// 보조 파일 경로
    secondary: PathBuf,
    /// 순환 정책
    policy: RotationPolicy,
    /// 최대 파일 크기 (설정 변경이 다음 기록부터 반영되도록 공유)
    max_file_size: Arc<AtomicU64>,
    /// 열린 파일 작성기
    writer: Option<BufWriter<File>>,
    /// 활성 파일의 현재 크기
    current_size: u64,
    /// 활성 슬롯
    active_slot: Slot,
    /// 순환 횟수
    rotations: u64,
    /// 직전 작업이 실패했는지 (실패 경고를 반복하지 않기 위함)
    failing: bool,
}

impl RotatingFileSink {
    /// 새 싱크 생성. 파일은 첫 기록 시에 열립니다.
    pub fn new<P: Into<PathBuf>>(
        path: P,
        rotation_suffix: &str,
        policy: RotationPolicy,
        max_file_size: Arc<AtomicU64>,
    ) -> Self {
        let primary = path.into();
        let secondary = secondary_path_for(&primary, rotation_suffix);
        Self {
            primary,
            secondary,
            policy,
            max_file_size,
            writer: None,
            current_size: 0,
            active_slot: Slot::Primary,
            rotations: 0,
            failing: false,
        }
    }

    /// 슬롯의 파일 경로
    pub fn slot_path(&self, slot: Slot) -> &Path {
        match slot {
            Slot::Primary => &self.primary,
            Slot::Secondary => &self.secondary,
        }
    }

    /// 활성 파일 경로
    pub fn active_path(&self) -> &Path {
        self.slot_path(self.active_slot)
    }

    /// 활성 슬롯
    pub fn active_slot(&self) -> Slot {
        self.active_slot
    }

    /// 활성 파일의 현재 크기
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// 파일 핸들이 열려 있는지
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// 지금까지의 순환 횟수
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// 한 줄 기록 (개행 추가)
    pub fn append(&mut self, line: &str) {
        match self.try_append(line) {
            Ok(()) => self.failing = false,
            Err(e) => {
                self.report("append", &e);
                // 다음 기록 때 다시 열도록 핸들을 버림
                self.writer = None;
            }
        }
    }

    /// 버퍼 플러시
    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                self.report("flush", &e);
            }
        }
    }

    /// 파일 핸들 닫기. 다음 기록 시 다시 열립니다.
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                self.report("close", &e);
            }
            debug!(path = %self.active_path().display(), "로그 파일 핸들 닫힘");
        }
    }

    fn try_append(&mut self, line: &str) -> io::Result<()> {
        let writer = self.ensure_open()?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.current_size += line.len() as u64 + 1;

        if self.current_size >= self.max_file_size.load(Ordering::Relaxed) {
            self.rotate()?;
        }
        Ok(())
    }

    fn ensure_open(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let path = self.active_path().to_path_buf();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.current_size = file.metadata()?.len();
            self.writer = Some(BufWriter::new(file));

            debug!(
                path = %path.display(),
                size = self.current_size,
                "로그 파일 열림"
            );
        }

        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "로그 파일이 열려 있지 않음"))
    }

    /// 활성 파일 순환
    ///
    /// 순환이 끝나면 새 활성 파일은 비어 있는 상태로 존재합니다.
    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let old_path = self.active_path().to_path_buf();
        match self.policy {
            RotationPolicy::RenameSwap => {
                // Windows에서는 대상이 있으면 rename이 실패하므로 먼저 삭제
                match fs::remove_file(&self.secondary) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                    _ => {}
                }
                fs::rename(&self.primary, &self.secondary)?;
            }
            RotationPolicy::TruncateOnReuse => {
                self.active_slot = self.active_slot.other();
            }
        }

        // 새 활성 파일 생성 (기존 내용은 비움)
        File::create(self.active_path())?;
        self.current_size = 0;
        self.rotations += 1;

        debug!(
            policy = self.policy.as_str(),
            old_path = %old_path.display(),
            new_path = %self.active_path().display(),
            "로그 파일 순환 완료"
        );
        Ok(())
    }

    fn report(&mut self, op: &str, error: &io::Error) {
        if !self.failing {
            warn!(
                op = op,
                path = %self.active_path().display(),
                error = %error,
                "로그 파일 기록 실패, 다음 기록 때 다시 시도합니다"
            );
        }
        self.failing = true;
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sink(dir: &TempDir, policy: RotationPolicy, max: u64) -> RotatingFileSink {
        RotatingFileSink::new(
            dir.path().join("logs").join("app.log"),
            "-prev",
            policy,
            Arc::new(AtomicU64::new(max)),
        )
    }

    fn size(path: &Path) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    #[test]
    fn test_append_creates_file_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = sink(&temp_dir, RotationPolicy::RenameSwap, 1024);
        assert!(!sink.is_open());

        sink.append("first line");
        sink.append("second line");
        sink.flush();

        assert!(sink.is_open());
        let content = fs::read_to_string(sink.slot_path(Slot::Primary)).unwrap();
        assert_eq!(content, "first line\nsecond line\n");
        assert_eq!(sink.current_size(), content.len() as u64);
    }

    #[test]
    fn test_rename_swap_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = sink(&temp_dir, RotationPolicy::RenameSwap, 1024);
        let line = "x".repeat(99); // 개행 포함 100바이트

        for _ in 0..10 {
            sink.append(&line);
        }
        assert_eq!(sink.rotations(), 0);
        assert_eq!(sink.current_size(), 1000);

        // 1024바이트를 넘기는 기록
        sink.append(&line);
        assert_eq!(sink.rotations(), 1);
        assert_eq!(sink.active_slot(), Slot::Primary);
        assert_eq!(size(sink.slot_path(Slot::Secondary)), 1100);
        assert!(sink.slot_path(Slot::Primary).exists());
        assert_eq!(size(sink.slot_path(Slot::Primary)), 0);

        sink.append("after rotation");
        sink.flush();
        let content = fs::read_to_string(sink.slot_path(Slot::Primary)).unwrap();
        assert_eq!(content, "after rotation\n");
    }

    #[test]
    fn test_truncate_on_reuse_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = sink(&temp_dir, RotationPolicy::TruncateOnReuse, 1024);
        let line = "y".repeat(99);

        for _ in 0..11 {
            sink.append(&line);
        }
        assert_eq!(sink.rotations(), 1);
        assert_eq!(sink.active_slot(), Slot::Secondary);
        assert_eq!(size(sink.slot_path(Slot::Primary)), 1100);

        sink.append("to secondary");
        sink.flush();
        let content = fs::read_to_string(sink.slot_path(Slot::Secondary)).unwrap();
        assert_eq!(content, "to secondary\n");

        // 두 번째 순환: 기본 파일이 비워지고 다시 활성화됨
        for _ in 0..11 {
            sink.append(&line);
        }
        assert_eq!(sink.rotations(), 2);
        assert_eq!(sink.active_slot(), Slot::Primary);
        assert_eq!(size(sink.slot_path(Slot::Primary)), 0);
        assert!(size(sink.slot_path(Slot::Secondary)) >= 1024);
    }

    #[test]
    fn test_total_size_is_bounded() {
        for policy in [RotationPolicy::RenameSwap, RotationPolicy::TruncateOnReuse] {
            let temp_dir = TempDir::new().unwrap();
            let max = 1024;
            let mut sink = sink(&temp_dir, policy, max);
            let line = "z".repeat(63);
            let line_size = 64;

            for _ in 0..500 {
                sink.append(&line);
                sink.flush();
                let primary = sink.slot_path(Slot::Primary);
                let secondary = sink.slot_path(Slot::Secondary);
                assert!(size(primary) + size(secondary) <= 2 * max + line_size);
                if sink.rotations() > 0 {
                    assert!(primary.exists() && secondary.exists());
                }
            }
            assert!(sink.rotations() > 1);

            let entries = fs::read_dir(temp_dir.path().join("logs")).unwrap().count();
            assert_eq!(entries, 2);
        }
    }

    #[test]
    fn test_existing_file_size_is_counted() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = sink(&temp_dir, RotationPolicy::RenameSwap, 1024);
        let primary = sink.slot_path(Slot::Primary).to_path_buf();
        fs::create_dir_all(primary.parent().unwrap()).unwrap();
        fs::write(&primary, vec![b'a'; 2000]).unwrap();

        sink.append("one more");
        assert_eq!(sink.rotations(), 1);
        assert_eq!(size(sink.slot_path(Slot::Secondary)), 2009);
    }

    #[test]
    fn test_max_size_change_applies_to_next_write() {
        let temp_dir = TempDir::new().unwrap();
        let max = Arc::new(AtomicU64::new(1024 * 1024));
        let mut sink = RotatingFileSink::new(
            temp_dir.path().join("app.log"),
            "-prev",
            RotationPolicy::RenameSwap,
            max.clone(),
        );

        sink.append("hello");
        assert_eq!(sink.rotations(), 0);

        max.store(8, Ordering::Relaxed);
        sink.append("world");
        assert_eq!(sink.rotations(), 1);
    }

    #[test]
    fn test_close_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = sink(&temp_dir, RotationPolicy::RenameSwap, 1024);

        sink.append("before close");
        sink.close();
        assert!(!sink.is_open());

        sink.append("after close");
        sink.flush();
        let content = fs::read_to_string(sink.slot_path(Slot::Primary)).unwrap();
        assert_eq!(content, "before close\nafter close\n");
    }

    #[test]
    fn test_io_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        // 디렉토리 자리에 일반 파일을 두어 열기 실패를 유도
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"not a dir").unwrap();

        let mut sink = RotatingFileSink::new(
            blocker.join("app.log"),
            "-prev",
            RotationPolicy::RenameSwap,
            Arc::new(AtomicU64::new(1024)),
        );

        sink.append("never written");
        sink.flush();
        sink.close();
        assert!(!sink.is_open());
        assert_eq!(sink.rotations(), 0);
    }
}
