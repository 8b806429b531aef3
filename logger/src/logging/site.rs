//! 호출 위치 해석기
//!
//! 로그 태그에 붙는 `.(파일명:줄번호)` 조각을 만듭니다.
//!
//! 스택 프레임은 호스트가 제공하는 기능으로 취급합니다. 레벨별 진입 함수는 모두
//! `#[track_caller]`이므로 컴파일러가 실제 호출자 프레임을 바로 넘겨주고,
//! 로거 내부 진입 함수를 건너뛰기 위한 고정 깊이는 [`CORE_FRAME_DEPTH`] (0)입니다.
//! 더 긴 스택을 제공할 수 있는 호스트는 프레임 목록과 건너뛸 깊이를 직접 넘깁니다.
//!
//! 포워딩 파사드를 거친 호출은 고정 깊이만으로는 신뢰할 수 없으므로, 등록된
//! 파사드에 속한 프레임을 바깥쪽으로 계속 건너뛰고 파사드 밖의 첫 프레임을
//! 사용합니다. 그런 프레임이 없으면 빈 문자열을 반환합니다.

use parking_lot::RwLock;
use std::panic::Location;
use std::path::Path;

/// 로거 자체 진입 함수에 해당하는 프레임 수
///
/// `#[track_caller]` 체인이 호출자 위치를 직접 전달하므로 건너뛸 프레임이 없습니다.
pub const CORE_FRAME_DEPTH: usize = 0;

/// 스택 프레임 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 프레임을 선언한 모듈 경로 (알 수 있는 경우)
    pub module_path: Option<String>,
    /// 소스 파일 경로
    pub file: String,
    /// 줄 번호
    pub line: u32,
}

impl Frame {
    /// 새 프레임 생성
    pub fn new<S: Into<String>>(file: S, line: u32) -> Self {
        Self {
            module_path: None,
            file: file.into(),
            line,
        }
    }

    /// 모듈 경로 설정
    pub fn with_module_path<S: Into<String>>(mut self, path: S) -> Self {
        self.module_path = Some(path.into());
        self
    }

    /// 경로를 제외한 파일 이름
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }

    /// `.(파일명:줄번호)` 형식의 태그 조각
    pub fn site_tag(&self) -> String {
        format!(".({}:{})", self.file_name(), self.line)
    }
}

impl From<&Location<'_>> for Frame {
    fn from(location: &Location<'_>) -> Self {
        Frame::new(location.file(), location.line())
    }
}

/// 호출 위치 해석기
#[derive(Debug, Default)]
pub struct SiteResolver {
    /// 파사드로 취급할 모듈 경로 접두사 또는 파일 경로 접미사
    facade_markers: RwLock<Vec<String>>,
}

impl SiteResolver {
    /// 새 해석기 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 파사드 표식 등록
    ///
    /// `my_app::log_tree` 같은 모듈 경로나 `src/log_tree.rs` 같은 파일 경로를 받습니다.
    /// 같은 표식을 여러 번 등록해도 한 번만 저장됩니다.
    pub fn register_facade<S: Into<String>>(&self, marker: S) {
        let marker = marker.into().replace('\\', "/");
        if marker.is_empty() {
            return;
        }
        let mut markers = self.facade_markers.write();
        if !markers.contains(&marker) {
            markers.push(marker);
        }
    }

    /// 등록된 파사드 표식 목록
    pub fn facade_markers(&self) -> Vec<String> {
        self.facade_markers.read().clone()
    }

    /// 프레임이 파사드에 속하는지 확인
    pub fn is_facade_frame(&self, frame: &Frame) -> bool {
        let file = frame.file.replace('\\', "/");
        self.facade_markers.read().iter().any(|marker| {
            let module_match = frame.module_path.as_deref().is_some_and(|path| {
                path == marker
                    || path
                        .strip_prefix(marker.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            });
            let file_match = file == *marker || file.ends_with(&format!("/{marker}"));
            module_match || file_match
        })
    }

    /// `skip`개 프레임을 건너뛴 첫 프레임의 태그 조각
    pub fn resolve<I>(&self, frames: I, skip: usize) -> String
    where
        I: IntoIterator<Item = Frame>,
    {
        frames
            .into_iter()
            .nth(skip)
            .map(|frame| frame.site_tag())
            .unwrap_or_default()
    }

    /// `skip`개 프레임을 건너뛴 뒤 파사드 프레임도 건너뛴 첫 프레임의 태그 조각
    ///
    /// 파사드 밖의 프레임이 없으면 빈 문자열을 반환합니다.
    pub fn resolve_bypassing_facades<I>(&self, frames: I, skip: usize) -> String
    where
        I: IntoIterator<Item = Frame>,
    {
        frames
            .into_iter()
            .skip(skip)
            .find(|frame| !self.is_facade_frame(frame))
            .map(|frame| frame.site_tag())
            .unwrap_or_default()
    }

    /// 현재 호출자의 태그 조각
    #[track_caller]
    pub fn caller_tag(&self) -> String {
        let caller = Frame::from(Location::caller());
        self.resolve(std::iter::once(caller), CORE_FRAME_DEPTH)
    }

    /// 파사드를 거친 현재 호출자의 태그 조각
    #[track_caller]
    pub fn caller_tag_bypassing_facades(&self) -> String {
        let caller = Frame::from(Location::caller());
        self.resolve_bypassing_facades(std::iter::once(caller), CORE_FRAME_DEPTH)
    }
}
