use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// 처리 대상 원본 파일.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub size_bytes: u64,
}

impl AudioFile {
    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("알 수 없음")
    }
}

/// 인식 서비스에 보낼 임시 샘플 구간.
/// 임시 파일은 이 값이 drop될 때 삭제된다.
#[derive(Debug)]
pub struct Excerpt {
    pub file: NamedTempFile,
    pub offset_secs: f64,
    pub duration_secs: f64,
}

impl Excerpt {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.file.path())
    }
}

/// 인식 서비스가 돌려준 곡 정보.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRecord {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub cover_url: Option<String>,
}

impl MatchRecord {
    /// 장르 이름들을 `", "`로 이어 붙인다.
    pub fn genre_text(&self) -> String {
        self.genres.join(", ")
    }

    pub fn summary(&self) -> String {
        match self.album {
            Some(ref album) => format!("{} - {} [{}]", self.artist, self.title, album),
            None => format!("{} - {}", self.artist, self.title),
        }
    }
}

/// 인식 요청 결과. 인식 실패(NoMatch)는 오류가 아니라 정상적인 결과로 취급한다.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Matched(MatchRecord),
    NoMatch { reason: String },
}

/// 파일 하나의 최종 처리 결과.
#[derive(Debug)]
pub enum Outcome {
    /// 이동과 태그 기록이 모두 끝났다.
    Tagged { dest: PathBuf, record: MatchRecord },
    /// 이동은 되었지만 태그 기록에 실패했다.
    MovedUntagged {
        dest: PathBuf,
        record: MatchRecord,
        error: String,
    },
    /// 인식되지 않아 원본을 그대로 두었다.
    NoMatch { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_text_joins_names() {
        let record = MatchRecord {
            genres: vec!["Pop".to_string(), "K-Pop".to_string()],
            ..Default::default()
        };
        assert_eq!(record.genre_text(), "Pop, K-Pop");
    }

    #[test]
    fn test_genre_text_empty() {
        assert_eq!(MatchRecord::default().genre_text(), "");
    }

    #[test]
    fn test_summary() {
        let record = MatchRecord {
            title: "Foo".to_string(),
            artist: "Bar".to_string(),
            album: Some("Baz".to_string()),
            ..Default::default()
        };
        assert_eq!(record.summary(), "Bar - Foo [Baz]");
    }
}
