pub mod acrcloud;
pub mod signer;

use crate::error::PipelineError;
use crate::models::Recognition;

/// 오디오 샘플을 곡 정보로 바꿔 주는 인식 서비스 트레이트.
/// ACRCloud 외의 서비스나 테스트용 가짜 구현을 이 트레이트로 추상화한다.
pub trait Recognizer {
    /// 샘플 바이트를 업로드하여 인식 결과를 받는다. 재시도는 하지 않는다.
    fn identify(&self, sample: &[u8]) -> Result<Recognition, PipelineError>;
}

/// 앨범 아트 이미지를 내려받는 트레이트.
pub trait CoverFetcher {
    fn fetch_cover(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}
