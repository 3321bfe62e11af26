use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::Input;

use crate::config::{self, Config, RecognitionConfig};
use crate::core::pipeline::{Pipeline, PipelineSettings, ScanReport};
use crate::core::probe::{Ffmpeg, MediaTool};
use crate::core::segment;
use crate::models::Outcome;
use crate::sources::acrcloud::AcrCloudClient;

#[derive(Parser)]
#[command(name = "mp3ident", about = "ACRCloud 음원 인식으로 MP3 파일 이름과 태그를 정리하는 도구")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 디렉토리(또는 파일)의 MP3를 인식하여 이동하고 태그를 기록
    Identify {
        /// 인식할 MP3 파일 또는 디렉토리
        source: PathBuf,
        /// 처리된 파일을 옮길 디렉토리 (기본값: ./out)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// 인식에 사용할 샘플 길이(초)
        #[arg(long)]
        window: Option<f64>,
        /// ffmpeg 실행 파일 경로
        #[arg(long)]
        ffmpeg: Option<PathBuf>,
        /// 인식 요청 타임아웃(초)
        #[arg(long)]
        timeout: Option<u64>,
        /// 임시 샘플을 만들 디렉토리
        #[arg(long = "temp-dir")]
        temp_dir: Option<PathBuf>,
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// 파일의 재생 시간과 샘플 구간을 표시
    Probe {
        /// 확인할 MP3 파일
        file: PathBuf,
        #[arg(long)]
        window: Option<f64>,
        #[arg(long)]
        ffmpeg: Option<PathBuf>,
    },
    /// ACRCloud 자격증명 설정
    Config,
}

/// 설정 파일보다 우선하는 자격증명.
#[derive(clap::Args)]
pub struct CredentialArgs {
    #[arg(long, env = "ACR_HOST")]
    pub host: Option<String>,
    #[arg(long = "access-key", env = "ACR_ACCESS_KEY")]
    pub access_key: Option<String>,
    #[arg(long = "access-secret", env = "ACR_ACCESS_SECRET", hide_env_values = true)]
    pub access_secret: Option<String>,
}

impl CredentialArgs {
    fn apply(self, cfg: &mut RecognitionConfig) {
        if self.host.is_some() {
            cfg.host = self.host;
        }
        if self.access_key.is_some() {
            cfg.access_key = self.access_key;
        }
        if self.access_secret.is_some() {
            cfg.access_secret = self.access_secret;
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Identify {
            source,
            dest,
            window,
            ffmpeg,
            timeout,
            temp_dir,
            credentials,
        } => {
            let mut cfg = config::load_config();
            credentials.apply(&mut cfg.recognition);
            if let Some(timeout) = timeout {
                cfg.recognition.timeout_secs = timeout;
            }
            if let Some(window) = window {
                cfg.excerpt.duration_secs = window;
            }
            if ffmpeg.is_some() {
                cfg.paths.ffmpeg = ffmpeg;
            }
            if dest.is_some() {
                cfg.paths.destination = dest;
            }
            if temp_dir.is_some() {
                cfg.paths.temp_dir = temp_dir;
            }
            cmd_identify(&source, cfg)
        }
        Commands::Probe {
            file,
            window,
            ffmpeg,
        } => {
            let cfg = config::load_config();
            cmd_probe(
                &file,
                window.unwrap_or(cfg.excerpt.duration_secs),
                ffmpeg.or(cfg.paths.ffmpeg),
            )
        }
        Commands::Config => cmd_config(),
    }
}

fn cmd_identify(source: &Path, cfg: Config) -> Result<()> {
    if !cfg.recognition.is_configured() {
        println!("ACRCloud가 설정되지 않았습니다. 먼저 'mp3ident config'를 실행하거나 ACR_* 환경 변수를 지정하세요.");
        return Ok(());
    }
    validate_window(cfg.excerpt.duration_secs)?;

    let client = AcrCloudClient::new(&cfg.recognition)?;
    let tool = Ffmpeg::new(cfg.paths.ffmpeg.clone());
    let settings = PipelineSettings {
        destination: cfg
            .paths
            .destination
            .clone()
            .unwrap_or_else(|| PathBuf::from("out")),
        temp_dir: cfg.paths.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
        excerpt_secs: cfg.excerpt.duration_secs,
    };

    let pipeline = Pipeline::new(&tool, &client, &client, settings);
    let report = pipeline
        .run(source)
        .with_context(|| format!("{}을(를) 스캔할 수 없습니다", source.display()))?;

    if report.entries.is_empty() {
        println!("{}에서 MP3 파일을 찾을 수 없습니다", source.display());
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &ScanReport) {
    let mut table = Table::new();
    table.set_header(vec!["파일", "결과", "상세"]);

    for entry in &report.entries {
        let file = entry
            .source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("알 수 없음");

        let (status, detail) = match &entry.result {
            Ok(Outcome::Tagged { dest, .. }) => ("완료", dest.display().to_string()),
            Ok(Outcome::MovedUntagged { dest, error, .. }) => {
                ("태그 실패", format!("{} ({})", dest.display(), error))
            }
            Ok(Outcome::NoMatch { reason }) => ("인식 안 됨", reason.clone()),
            Err(e) => ("오류", format!("[{}] {}", e.stage(), e)),
        };

        table.add_row(vec![Cell::new(file), Cell::new(status), Cell::new(&detail)]);
    }

    println!("{table}");
    println!(
        "\n총 {} 파일 (완료: {}, 태그 실패: {}, 인식 안 됨: {}, 오류: {})",
        report.entries.len(),
        report.tagged(),
        report.untagged(),
        report.no_match(),
        report.failed(),
    );
}

/// 샘플 길이는 0보다 큰 유한한 값이어야 한다.
fn validate_window(window: f64) -> Result<()> {
    if !window.is_finite() || window <= 0.0 {
        anyhow::bail!("샘플 길이는 0보다 커야 합니다: {}", window);
    }
    Ok(())
}

fn cmd_probe(file: &Path, window: f64, ffmpeg: Option<PathBuf>) -> Result<()> {
    validate_window(window)?;
    let tool = Ffmpeg::new(ffmpeg);
    let total = tool.duration(file)?;
    let segment = segment::compute_window(file, total, window)?;

    println!("파일: {}", file.display());
    println!("재생 시간: {:.2}초", total);
    println!(
        "샘플 구간: {:.2}초부터 {:.2}초 동안",
        segment.start, segment.length
    );
    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("ACRCloud 설정");
    println!("(프로젝트의 host, access key, access secret은 ACRCloud 콘솔에서 확인하세요)\n");

    let host: String = Input::new()
        .with_prompt("Host")
        .with_initial_text(cfg.recognition.host.clone().unwrap_or_default())
        .interact_text()?;

    let access_key: String = Input::new()
        .with_prompt("Access Key")
        .with_initial_text(cfg.recognition.access_key.clone().unwrap_or_default())
        .interact_text()?;

    let access_secret: String = Input::new()
        .with_prompt("Access Secret")
        .with_initial_text(cfg.recognition.access_secret.clone().unwrap_or_default())
        .interact_text()?;

    cfg.recognition = RecognitionConfig {
        host: Some(host),
        access_key: Some(access_key),
        access_secret: Some(access_secret),
        timeout_secs: cfg.recognition.timeout_secs,
    };

    config::save_config(&cfg)?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}
