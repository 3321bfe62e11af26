use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::core::probe::MediaTool;
use crate::core::{renamer, scanner, segment, tagger};
use crate::error::PipelineError;
use crate::models::{AudioFile, Outcome, Recognition};
use crate::sources::{CoverFetcher, Recognizer};

/// 파이프라인 실행에 필요한 경로와 값.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub destination: PathBuf,
    pub temp_dir: PathBuf,
    pub excerpt_secs: f64,
}

/// 길이 측정 → 구간 추출 → 인식 → 이동/태그 기록을 파일 하나씩 순서대로 수행한다.
pub struct Pipeline<'a> {
    tool: &'a dyn MediaTool,
    recognizer: &'a dyn Recognizer,
    covers: &'a dyn CoverFetcher,
    settings: PipelineSettings,
}

/// 파일 하나의 처리 결과.
#[derive(Debug)]
pub struct ReportEntry {
    pub source: PathBuf,
    pub result: Result<Outcome, PipelineError>,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub entries: Vec<ReportEntry>,
}

impl ScanReport {
    pub fn tagged(&self) -> usize {
        self.count(|r| matches!(r, Ok(Outcome::Tagged { .. })))
    }

    pub fn untagged(&self) -> usize {
        self.count(|r| matches!(r, Ok(Outcome::MovedUntagged { .. })))
    }

    pub fn no_match(&self) -> usize {
        self.count(|r| matches!(r, Ok(Outcome::NoMatch { .. })))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| r.is_err())
    }

    fn count(&self, pred: impl Fn(&Result<Outcome, PipelineError>) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.result)).count()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(
        tool: &'a dyn MediaTool,
        recognizer: &'a dyn Recognizer,
        covers: &'a dyn CoverFetcher,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            tool,
            recognizer,
            covers,
            settings,
        }
    }

    /// 경로 아래의 모든 MP3 파일을 처리한다.
    /// 파일 하나의 실패는 로그로 남기고 다음 파일로 넘어간다.
    pub fn run(&self, root: &Path) -> Result<ScanReport> {
        let files = scanner::scan_path(root, Some(&self.settings.destination))?;
        info!(root = %root.display(), count = files.len(), "스캔을 시작합니다");

        let mut report = ScanReport::default();
        for path in files {
            let result = self.process_file(&path);
            log_result(&path, &result);
            report.entries.push(ReportEntry {
                source: path,
                result,
            });
        }

        Ok(report)
    }

    /// 파일 하나를 처리한다. 임시 샘플은 인식 요청 직후 항상 삭제된다.
    pub fn process_file(&self, path: &Path) -> Result<Outcome, PipelineError> {
        let audio = AudioFile {
            path: path.to_path_buf(),
            duration_secs: self.tool.duration(path)?,
            size_bytes: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        };
        info!(
            file = audio.filename(),
            duration = audio.duration_secs,
            size = audio.size_bytes,
            "인식 중"
        );

        let recognition = {
            let excerpt = segment::extract_middle_segment(
                self.tool,
                &audio.path,
                audio.duration_secs,
                self.settings.excerpt_secs,
                &self.settings.temp_dir,
            )?;
            debug!(
                offset = excerpt.offset_secs,
                length = excerpt.duration_secs,
                "샘플 업로드"
            );
            let result = excerpt
                .read_bytes()
                .map_err(PipelineError::from)
                .and_then(|sample| self.recognizer.identify(&sample));

            let temp_path = excerpt.path().to_path_buf();
            if let Err(e) = excerpt.file.close() {
                warn!(temp = %temp_path.display(), error = %e, "임시 샘플을 삭제하지 못했습니다");
            }
            result?
        };

        let record = match recognition {
            Recognition::Matched(record) => record,
            Recognition::NoMatch { reason } => return Ok(Outcome::NoMatch { reason }),
        };

        let dest = renamer::relocate(&audio.path, &self.settings.destination, &record)?;

        match tagger::write_match_tags(&dest, &record, self.covers) {
            Ok(()) => Ok(Outcome::Tagged { dest, record }),
            Err(e) => Ok(Outcome::MovedUntagged {
                dest,
                record,
                error: e.to_string(),
            }),
        }
    }
}

fn log_result(path: &Path, result: &Result<Outcome, PipelineError>) {
    let file = path.display();
    match result {
        Ok(Outcome::Tagged { dest, record }) => {
            info!(%file, dest = %dest.display(), track = %record.summary(), "처리 완료");
        }
        Ok(Outcome::MovedUntagged { dest, record, error }) => {
            error!(%file, dest = %dest.display(), track = %record.summary(), stage = "tag", %error, "이동했지만 태그를 기록하지 못했습니다");
        }
        Ok(Outcome::NoMatch { reason }) => {
            info!(%file, %reason, "인식되지 않아 건너뜁니다");
        }
        Err(e) => {
            error!(%file, stage = e.stage(), error = %e, "처리 중 오류가 발생해 건너뜁니다");
        }
    }
}
