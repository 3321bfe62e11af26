use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::config::RecognitionConfig;
use crate::error::PipelineError;
use crate::models::{MatchRecord, Recognition};
use crate::sources::signer::{self, DATA_TYPE, HTTP_URI, SIGNATURE_VERSION};
use crate::sources::{CoverFetcher, Recognizer};

/// ACRCloud identify API 클라이언트.
pub struct AcrCloudClient {
    client: reqwest::blocking::Client,
    host: String,
    access_key: String,
    access_secret: String,
}

#[derive(Deserialize)]
struct IdentifyResponse {
    status: Option<AcrStatus>,
    metadata: Option<AcrMetadata>,
}

#[derive(Deserialize)]
struct AcrStatus {
    code: Option<i64>,
    msg: Option<String>,
}

#[derive(Deserialize)]
struct AcrMetadata {
    music: Option<Vec<AcrMusic>>,
}

#[derive(Deserialize)]
struct AcrMusic {
    title: Option<String>,
    artists: Option<Vec<AcrName>>,
    album: Option<AcrAlbum>,
    genres: Option<Vec<AcrName>>,
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct AcrName {
    name: Option<String>,
}

/// `null` 목록과 이름 없는 항목을 걸러 이름만 남긴다.
fn names(list: Option<Vec<AcrName>>) -> Vec<String> {
    list.unwrap_or_default()
        .into_iter()
        .filter_map(|n| n.name)
        .filter(|n| !n.is_empty())
        .collect()
}

#[derive(Deserialize)]
struct AcrAlbum {
    name: Option<String>,
    cover: Option<AcrCover>,
}

#[derive(Deserialize)]
struct AcrCover {
    url: Option<String>,
}

impl AcrCloudClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self> {
        let host = config
            .host
            .as_ref()
            .context("ACRCloud host가 설정되지 않았습니다")?;
        let access_key = config
            .access_key
            .as_ref()
            .context("ACRCloud access_key가 설정되지 않았습니다")?;
        let access_secret = config
            .access_secret
            .as_ref()
            .context("ACRCloud access_secret가 설정되지 않았습니다")?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("HTTP 클라이언트 생성에 실패했습니다")?;

        Ok(Self {
            client,
            host: host.clone(),
            access_key: access_key.clone(),
            access_secret: access_secret.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("https://{}{}", self.host, HTTP_URI)
    }
}

impl Recognizer for AcrCloudClient {
    fn identify(&self, sample: &[u8]) -> Result<Recognition, PipelineError> {
        let timestamp = unix_timestamp().to_string();
        let to_sign = signer::string_to_sign(&self.access_key, SIGNATURE_VERSION, &timestamp);
        let signature = signer::create_signature(&to_sign, &self.access_secret);

        let form = Form::new()
            .part(
                "sample",
                Part::bytes(sample.to_vec()).file_name("sample.mp3"),
            )
            .text("access_key", self.access_key.clone())
            .text("data_type", DATA_TYPE)
            .text("signature_version", SIGNATURE_VERSION)
            .text("signature", signature)
            .text("timestamp", timestamp)
            .text("sample_bytes", sample.len().to_string());

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .map_err(|e| PipelineError::RequestFailed(format!("연결 실패: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| PipelineError::RequestFailed(format!("응답 읽기 실패: {}", e)))?;

        if !status.is_success() {
            return Err(PipelineError::RequestFailed(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        debug!(response = %body, "ACRCloud 응답");
        parse_response(&body)
    }
}

impl CoverFetcher for AcrCloudClient {
    fn fetch_cover(&self, url: &str) -> Result<Vec<u8>> {
        let data = self
            .client
            .get(url)
            .send()
            .context("앨범 아트 다운로드에 실패했습니다")?
            .error_for_status()?
            .bytes()?
            .to_vec();

        Ok(data)
    }
}

/// identify 응답 JSON을 해석한다.
///
/// - `metadata.music`에 항목이 있으면 첫 번째 항목을 `Matched`로 반환한다.
/// - JSON은 정상이지만 `metadata.music`이 없거나 비어 있으면 `NoMatch`.
/// - JSON이 아니거나 첫 항목에 제목/아티스트가 없으면 `RequestFailed`.
pub fn parse_response(body: &str) -> Result<Recognition, PipelineError> {
    let resp: IdentifyResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::RequestFailed(format!("응답 파싱 실패: {}", e)))?;

    let music = resp
        .metadata
        .and_then(|m| m.music)
        .and_then(|list| list.into_iter().next());

    let Some(music) = music else {
        return Ok(Recognition::NoMatch {
            reason: no_match_reason(resp.status.as_ref()),
        });
    };

    let title = music
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PipelineError::RequestFailed("인식 결과에 제목이 없습니다".to_string()))?;
    let artist = names(music.artists)
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::RequestFailed("인식 결과에 아티스트가 없습니다".to_string()))?;

    let (album, cover_url) = match music.album {
        Some(album) => (album.name, album.cover.and_then(|c| c.url)),
        None => (None, None),
    };

    Ok(Recognition::Matched(MatchRecord {
        title,
        artist,
        album,
        genres: names(music.genres),
        release_date: music.release_date,
        cover_url,
    }))
}

fn no_match_reason(status: Option<&AcrStatus>) -> String {
    match status {
        Some(AcrStatus {
            code: Some(code),
            msg: Some(msg),
        }) => format!("{} ({})", msg, code),
        Some(AcrStatus { msg: Some(msg), .. }) => msg.clone(),
        Some(AcrStatus { code: Some(code), .. }) => format!("status code {}", code),
        _ => "응답에 metadata.music이 없습니다".to_string(),
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
