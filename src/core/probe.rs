use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PipelineError;

/// 외부 미디어 도구(ffmpeg)가 제공하는 기능.
/// 테스트에서는 가짜 구현으로 대체한다.
pub trait MediaTool {
    /// 파일의 전체 재생 시간(초)을 구한다.
    fn duration(&self, path: &Path) -> Result<f64, PipelineError>;
    /// `input`의 `start`초부터 `length`초 구간을 재인코딩 없이 `output`에 쓴다.
    fn extract(
        &self,
        input: &Path,
        start: f64,
        length: f64,
        output: &Path,
    ) -> Result<(), PipelineError>;
}

/// ffmpeg 서브프로세스 래퍼.
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    /// 경로가 주어지지 않으면 PATH의 `ffmpeg`를 사용한다.
    pub fn new(program: Option<PathBuf>) -> Self {
        Self {
            program: program.unwrap_or_else(|| PathBuf::from("ffmpeg")),
        }
    }
}

impl MediaTool for Ffmpeg {
    fn duration(&self, path: &Path) -> Result<f64, PipelineError> {
        // `ffmpeg -i`는 출력 파일이 없어서 항상 실패 코드로 끝나므로 종료 코드는 보지 않는다.
        let output = Command::new(&self.program)
            .arg("-hide_banner")
            .arg("-i")
            .arg(path)
            .output()
            .map_err(|e| PipelineError::DurationUnavailable {
                path: path.to_path_buf(),
                reason: format!("{} 실행 실패: {}", self.program.display(), e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        parse_duration(&stderr).ok_or_else(|| PipelineError::DurationUnavailable {
            path: path.to_path_buf(),
            reason: "출력에 Duration 항목이 없습니다".to_string(),
        })
    }

    fn extract(
        &self,
        input: &Path,
        start: f64,
        length: f64,
        output: &Path,
    ) -> Result<(), PipelineError> {
        let result = Command::new(&self.program)
            .args(extract_args(input, start, length, output))
            .output()
            .map_err(|e| PipelineError::ExtractionFailed {
                path: input.to_path_buf(),
                reason: format!("{} 실행 실패: {}", self.program.display(), e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PipelineError::ExtractionFailed {
                path: input.to_path_buf(),
                reason: format!("{}: {}", result.status, tail(stderr.trim(), 300)),
            });
        }

        Ok(())
    }
}

/// 재인코딩 없이 구간을 잘라내는 ffmpeg 인자.
/// 입력 뒤에 `-ss`를 두어 출력 쪽에서 자르고, 커버 이미지 스트림은 뺀다.
fn extract_args(input: &Path, start: f64, length: f64, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_os_string());
    args.push("-ss".into());
    args.push(format!("{:.3}", start).into());
    args.push("-t".into());
    args.push(format!("{:.3}", length).into());
    args.extend(["-vn", "-acodec", "copy"].iter().map(OsString::from));
    args.push(output.as_os_str().to_os_string());
    args
}

/// ffmpeg 진단 출력에서 `Duration: HH:MM:SS.ss` 항목을 찾아 초 단위로 변환한다.
pub fn parse_duration(output: &str) -> Option<f64> {
    let line = output.lines().find(|l| l.contains("Duration:"))?;
    let after = line.split("Duration:").nth(1)?;
    let field = after.split(',').next()?.trim();

    let parts: Vec<&str> = field.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max_chars)).collect()
}
