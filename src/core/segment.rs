use std::path::Path;

use tracing::debug;

use crate::core::probe::MediaTool;
use crate::error::PipelineError;
use crate::models::Excerpt;

/// 원본에서 잘라낼 구간.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub start: f64,
    pub length: f64,
}

/// 곡의 한가운데 `window`초 구간을 계산한다.
///
/// 전체 길이가 `window`보다 짧으면 시작을 0으로 두고 길이를 전체 길이로 줄인다.
/// 길이가 0 이하이거나 유한하지 않으면 재생 시간을 알 수 없는 것으로 본다.
pub fn compute_window(
    path: &Path,
    total: f64,
    window: f64,
) -> Result<SegmentWindow, PipelineError> {
    if !total.is_finite() || total <= 0.0 {
        return Err(PipelineError::DurationUnavailable {
            path: path.to_path_buf(),
            reason: format!("잘못된 재생 시간: {}", total),
        });
    }

    if total < window {
        return Ok(SegmentWindow {
            start: 0.0,
            length: total,
        });
    }

    Ok(SegmentWindow {
        start: (total - window) / 2.0,
        length: window,
    })
}

/// 곡 중간 구간을 임시 파일로 추출한다.
/// 임시 파일 이름은 호출마다 달라지며, 반환된 Excerpt가 drop되면 삭제된다.
pub fn extract_middle_segment(
    tool: &dyn MediaTool,
    path: &Path,
    total: f64,
    window: f64,
    temp_dir: &Path,
) -> Result<Excerpt, PipelineError> {
    let segment = compute_window(path, total, window)?;

    let file = tempfile::Builder::new()
        .prefix("mp3ident-")
        .suffix(".mp3")
        .tempfile_in(temp_dir)?;

    debug!(
        path = %path.display(),
        start = segment.start,
        length = segment.length,
        temp = %file.path().display(),
        "구간 추출"
    );

    tool.extract(path, segment.start, segment.length, file.path())?;

    Ok(Excerpt {
        file,
        offset_secs: segment.start,
        duration_secs: segment.length,
    })
}
