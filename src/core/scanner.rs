use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;
use walkdir::WalkDir;

/// 디렉토리를 재귀 탐색하여 모든 MP3 파일 경로를 모은다.
/// `exclude` 아래의 파일(처리 결과를 옮기는 디렉토리)은 건너뛴다.
/// 읽을 수 없는 항목은 로그만 남기고 계속 진행한다.
pub fn scan_directory(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("{}은(는) 디렉토리가 아닙니다", dir.display());
    }

    let exclude = exclude.map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    let mut files = Vec::new();

    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        match &exclude {
            Some(ex) if entry.file_type().is_dir() => !is_same_dir(entry.path(), ex),
            _ => true,
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "디렉토리 항목을 읽을 수 없어 건너뜁니다");
                continue;
            }
        };

        if entry.file_type().is_file() && is_mp3(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// 확장자가 .mp3인지 확인한다 (대소문자 무시).
pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

fn is_same_dir(path: &Path, canonical: &Path) -> bool {
    path.canonicalize()
        .map(|p| p == canonical)
        .unwrap_or(false)
}

/// 경로가 디렉토리면 재귀 스캔, 파일이면 단일 파일 목록을 반환한다.
pub fn scan_path(path: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        return scan_directory(path, exclude);
    }
    if !path.exists() {
        anyhow::bail!("파일을 찾을 수 없습니다: {}", path.display());
    }
    if !is_mp3(path) {
        anyhow::bail!("MP3 파일이 아닙니다: {}", path.display());
    }
    Ok(vec![path.to_path_buf()])
}
