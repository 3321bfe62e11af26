use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::models::MatchRecord;

/// 파일명에 쓸 수 없는 문자 집합. 플랫폼과 관계없이 모두 치환한다.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// 파일명에 사용할 수 없는 문자를 `_`로 치환한다. 그 밖의 문자는 건드리지 않는다.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// MatchRecord에서 `"{title} - {artist}.mp3"` 형식의 파일명을 생성한다.
pub fn build_filename(record: &MatchRecord) -> String {
    format!(
        "{} - {}.mp3",
        sanitize_filename(&record.title),
        sanitize_filename(&record.artist)
    )
}

/// `dir/name`이 이미 있으면 ` (1)`, ` (2)`, ... 를 붙여 비어 있는 경로를 찾는다.
pub fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let ext = path.extension().and_then(|e| e.to_str());

    let mut n = 1u32;
    loop {
        let file_name = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// 원본 파일을 `destination/"{title} - {artist}.mp3"`로 옮긴다.
/// 대상 디렉토리가 없으면 만들고, 같은 이름의 파일은 덮어쓰지 않는다.
/// 성공하면 원본 경로는 더 이상 존재하지 않는다.
pub fn relocate(
    source: &Path,
    destination: &Path,
    record: &MatchRecord,
) -> Result<PathBuf, PipelineError> {
    let new_name = build_filename(record);

    std::fs::create_dir_all(destination).map_err(|e| PipelineError::MoveFailed {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    })?;

    let new_path = unique_destination(destination, &new_name);

    move_file(source, &new_path).map_err(|e| PipelineError::MoveFailed {
        from: source.to_path_buf(),
        to: new_path.clone(),
        source: e,
    })?;

    Ok(new_path)
}

/// rename이 안 되면(다른 파일시스템 등) 복사 후 원본을 지운다.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    let rename_err = match std::fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !from.is_file() {
        return Err(rename_err);
    }

    if let Err(e) = std::fs::copy(from, to) {
        let _ = std::fs::remove_file(to);
        return Err(e);
    }

    if let Err(e) = std::fs::remove_file(from) {
        let _ = std::fs::remove_file(to);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, artist: &str) -> MatchRecord {
        MatchRecord {
            title: title.to_string(),
            artist: artist.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_filename_reserved_chars() {
        assert_eq!(sanitize_filename(r#"<>:"/\|?*"#), "_________");
    }

    #[test]
    fn test_sanitize_filename_title_with_slash_and_colon() {
        assert_eq!(sanitize_filename("A/B: Test"), "A_B_ Test");
    }

    #[test]
    fn test_sanitize_filename_is_idempotent() {
        for s in ["A/B: Test", "AC/DC", "What?", "아이유 - 좋은날", "plain"] {
            let once = sanitize_filename(s);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn test_sanitize_filename_keeps_other_chars() {
        let s = "Hello World! (feat. 아이유) [2019] & 'more' #1 ~ 100%";
        assert_eq!(sanitize_filename(s), s);
    }

    #[test]
    fn test_build_filename_title_first() {
        assert_eq!(build_filename(&record("Foo", "Bar")), "Foo - Bar.mp3");
    }

    #[test]
    fn test_build_filename_sanitizes() {
        assert_eq!(
            build_filename(&record("Back In Black?", "AC/DC")),
            "Back In Black_ - AC_DC.mp3"
        );
    }

    #[test]
    fn test_relocate_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("song.mp3");
        std::fs::write(&src, b"audio").unwrap();
        let dest = dir.path().join("out").join("nested");

        let new_path = relocate(&src, &dest, &record("Foo", "Bar")).unwrap();

        assert_eq!(new_path, dest.join("Foo - Bar.mp3"));
        assert!(!src.exists());
        assert_eq!(std::fs::read(&new_path).unwrap(), b"audio");
    }

    #[test]
    fn test_relocate_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("Foo - Bar.mp3"), b"first").unwrap();
        std::fs::write(dest.join("Foo - Bar (1).mp3"), b"second").unwrap();

        let src = dir.path().join("song.mp3");
        std::fs::write(&src, b"third").unwrap();

        let new_path = relocate(&src, &dest, &record("Foo", "Bar")).unwrap();

        assert_eq!(new_path, dest.join("Foo - Bar (2).mp3"));
        assert_eq!(std::fs::read(dest.join("Foo - Bar.mp3")).unwrap(), b"first");
        assert_eq!(std::fs::read(&new_path).unwrap(), b"third");
    }

    #[test]
    fn test_relocate_missing_source_is_move_failed() {
        let dir = tempfile::tempdir().unwrap();
        let err = relocate(
            &dir.path().join("missing.mp3"),
            &dir.path().join("out"),
            &record("Foo", "Bar"),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::MoveFailed { .. }));
    }
}
