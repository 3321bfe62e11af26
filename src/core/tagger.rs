use std::path::Path;

use id3::{Tag, TagLike, Version};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::models::MatchRecord;
use crate::sources::CoverFetcher;

/// 발매일을 기록하는 ID3v2.4 프레임 (Recording time).
const RELEASE_DATE_FRAME: &str = "TDRC";

/// MatchRecord를 MP3 파일에 ID3v2.4 태그로 기록한다.
///
/// 태그가 없으면 새로 만든다. 앨범 아트 URL이 있을 때만 이미지를 내려받으며,
/// 다운로드에 실패해도 나머지 태그는 계속 기록한다.
pub fn write_match_tags(
    path: &Path,
    record: &MatchRecord,
    covers: &dyn CoverFetcher,
) -> Result<(), PipelineError> {
    let mut tag = open_tag(path)?;

    if let Some(ref url) = record.cover_url {
        match covers.fetch_cover(url) {
            Ok(data) => {
                tag.remove_all_pictures();
                tag.add_frame(id3::frame::Picture {
                    mime_type: "image/jpeg".to_string(),
                    picture_type: id3::frame::PictureType::CoverFront,
                    description: String::new(),
                    data,
                });
                debug!(path = %path.display(), url = %url, "앨범 아트를 추가했습니다");
            }
            Err(e) => {
                warn!(path = %path.display(), url = %url, error = %e, "앨범 아트 없이 태그를 기록합니다");
            }
        }
    }

    apply_text_frames(&mut tag, record);

    tag.write_to_path(path, Version::Id3v24)
        .map_err(|e| PipelineError::TagWriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// 기존 태그를 읽는다. 태그가 없으면 빈 태그를 돌려준다.
fn open_tag(path: &Path) -> Result<Tag, PipelineError> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => Ok(Tag::new()),
        Err(e) => Err(PipelineError::TagWriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

fn apply_text_frames(tag: &mut Tag, record: &MatchRecord) {
    tag.set_title(&record.title);
    tag.set_artist(&record.artist);

    if let Some(ref album) = record.album {
        tag.set_album(album);
    }

    let genre = record.genre_text();
    if !genre.is_empty() {
        tag.set_genre(genre);
    }

    if let Some(ref date) = record.release_date {
        if !date.is_empty() {
            tag.set_text(RELEASE_DATE_FRAME, date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubCovers {
        calls: Cell<u32>,
        result: Option<Vec<u8>>,
    }

    impl CoverFetcher for StubCovers {
        fn fetch_cover(&self, _url: &str) -> anyhow::Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            self.result
                .clone()
                .ok_or_else(|| anyhow::anyhow!("404 Not Found"))
        }
    }

    fn full_record() -> MatchRecord {
        MatchRecord {
            title: "Blueming".to_string(),
            artist: "IU".to_string(),
            album: Some("Love poem".to_string()),
            genres: vec!["K-Pop".to_string(), "Ballad".to_string()],
            release_date: Some("2019-11-18".to_string()),
            cover_url: Some("https://img.example/cover.jpg".to_string()),
        }
    }

    fn audio_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("track.mp3");
        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_writes_all_fields_and_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = audio_file(dir.path());
        let covers = StubCovers {
            calls: Cell::new(0),
            result: Some(vec![0xFF, 0xD8, 0xFF, 0xE0]),
        };

        write_match_tags(&path, &full_record(), &covers).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Blueming"));
        assert_eq!(tag.artist(), Some("IU"));
        assert_eq!(tag.album(), Some("Love poem"));
        assert_eq!(tag.genre(), Some("K-Pop, Ballad"));
        assert_eq!(
            tag.get(RELEASE_DATE_FRAME).and_then(|f| f.content().text()),
            Some("2019-11-18")
        );
        let picture = tag.pictures().next().unwrap();
        assert_eq!(picture.picture_type, id3::frame::PictureType::CoverFront);
        assert_eq!(picture.mime_type, "image/jpeg");
        assert_eq!(picture.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(covers.calls.get(), 1);
    }

    #[test]
    fn test_no_cover_url_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = audio_file(dir.path());
        let covers = StubCovers {
            calls: Cell::new(0),
            result: Some(vec![1, 2, 3]),
        };
        let record = MatchRecord {
            cover_url: None,
            ..full_record()
        };

        write_match_tags(&path, &record, &covers).unwrap();

        assert_eq!(covers.calls.get(), 0);
        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Blueming"));
        assert_eq!(tag.album(), Some("Love poem"));
        assert_eq!(tag.genre(), Some("K-Pop, Ballad"));
        assert_eq!(tag.pictures().count(), 0);
    }

    #[test]
    fn test_cover_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = audio_file(dir.path());
        let covers = StubCovers {
            calls: Cell::new(0),
            result: None,
        };

        write_match_tags(&path, &full_record(), &covers).unwrap();

        assert_eq!(covers.calls.get(), 1);
        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.artist(), Some("IU"));
        assert_eq!(tag.pictures().count(), 0);
    }

    #[test]
    fn test_overwrites_existing_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = audio_file(dir.path());
        let mut old = Tag::new();
        old.set_title("track01");
        old.set_year(1999);
        old.write_to_path(&path, Version::Id3v24).unwrap();

        let covers = StubCovers {
            calls: Cell::new(0),
            result: None,
        };
        let record = MatchRecord {
            title: "Foo".to_string(),
            artist: "Bar".to_string(),
            ..Default::default()
        };
        write_match_tags(&path, &record, &covers).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Foo"));
        assert_eq!(tag.artist(), Some("Bar"));
        assert_eq!(tag.genre(), None);
    }

    #[test]
    fn test_missing_file_is_tag_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        let covers = StubCovers {
            calls: Cell::new(0),
            result: None,
        };
        let err = write_match_tags(&dir.path().join("gone.mp3"), &full_record(), &covers)
            .unwrap_err();
        assert!(matches!(err, PipelineError::TagWriteFailed { .. }));
    }
}
