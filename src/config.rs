use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXCERPT_SECS: f64 = 30.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub excerpt: ExcerptConfig,
}

/// 인식 서비스(ACRCloud) 접속 정보.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub host: Option<String>,
    pub access_key: Option<String>,
    pub access_secret: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            host: None,
            access_key: None,
            access_secret: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RecognitionConfig {
    pub fn is_configured(&self) -> bool {
        self.host.as_ref().is_some_and(|s| !s.is_empty())
            && self.access_key.as_ref().is_some_and(|s| !s.is_empty())
            && self.access_secret.as_ref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    /// ffmpeg 실행 파일. 없으면 PATH에서 찾는다.
    pub ffmpeg: Option<PathBuf>,
    /// 처리된 파일을 옮길 디렉토리.
    pub destination: Option<PathBuf>,
    /// 임시 샘플을 만들 디렉토리. 없으면 시스템 임시 디렉토리.
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcerptConfig {
    #[serde(default = "default_excerpt_secs")]
    pub duration_secs: f64,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_EXCERPT_SECS,
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_excerpt_secs() -> f64 {
    DEFAULT_EXCERPT_SECS
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("mp3ident")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "설정 파일을 해석할 수 없어 기본값을 사용합니다");
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}
