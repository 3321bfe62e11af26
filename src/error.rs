use std::path::PathBuf;

/// 파일 하나를 처리하는 동안 발생할 수 있는 오류.
/// 모든 오류는 스캔 루프에서 파일 단위로 잡혀 로그로 남고, 다음 파일로 넘어간다.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("재생 시간을 알 수 없습니다 ({path}): {reason}")]
    DurationUnavailable { path: PathBuf, reason: String },

    #[error("구간 추출에 실패했습니다 ({path}): {reason}")]
    ExtractionFailed { path: PathBuf, reason: String },

    #[error("인식 요청에 실패했습니다: {0}")]
    RequestFailed(String),

    #[error("파일 이동에 실패했습니다 ({from} -> {to}): {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("태그 기록에 실패했습니다 ({path}): {reason}")]
    TagWriteFailed { path: PathBuf, reason: String },

    #[error("입출력 오류: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// 로그에 남길 처리 단계 이름.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::DurationUnavailable { .. } => "probe",
            PipelineError::ExtractionFailed { .. } => "extract",
            PipelineError::RequestFailed(_) => "recognize",
            PipelineError::MoveFailed { .. } => "move",
            PipelineError::TagWriteFailed { .. } => "tag",
            PipelineError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let err = PipelineError::RequestFailed("timeout".to_string());
        assert_eq!(err.stage(), "recognize");

        let err = PipelineError::DurationUnavailable {
            path: PathBuf::from("a.mp3"),
            reason: "no Duration field".to_string(),
        };
        assert_eq!(err.stage(), "probe");
        assert!(err.to_string().contains("a.mp3"));
    }
}
