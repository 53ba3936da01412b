//! yt-dlp backed media fetcher

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::{FetchedMedia, MediaFetcher, ProgressCallback};
use crate::config::{Config, DownloadConfig};
use crate::error::FetchError;
use crate::types::{ProgressEvent, ProgressPhase};

/// Executable name searched on PATH
const YTDLP_BINARY: &str = "yt-dlp";

/// Marker prepended to machine-readable progress lines
const PROGRESS_PREFIX: &str = "[progress]";

/// Progress line layout: `status|downloaded|total|estimate|filename`
const PROGRESS_TEMPLATE: &str = "download:[progress]%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.filename)s";

/// Number of stderr lines kept for error reporting
const STDERR_TAIL_LINES: usize = 5;

/// [`MediaFetcher`] that runs the external `yt-dlp` binary
///
/// # Examples
///
/// ```no_run
/// use raiplay_dl::config::DownloadConfig;
/// use raiplay_dl::fetch::YtDlpFetcher;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/local/bin/yt-dlp"), &DownloadConfig::default());
///
/// // Or auto-discover from PATH
/// let fetcher = YtDlpFetcher::from_path(&DownloadConfig::default())
///     .expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    format: String,
    write_subtitles: bool,
}

impl YtDlpFetcher {
    /// Create a fetcher with an explicit binary path
    pub fn new(binary_path: PathBuf, download: &DownloadConfig) -> Self {
        Self {
            binary_path,
            format: download.format.clone(),
            write_subtitles: download.write_subtitles,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path(download: &DownloadConfig) -> Option<Self> {
        which::which(YTDLP_BINARY)
            .ok()
            .map(|path| Self::new(path, download))
    }

    /// Build a fetcher from configuration: the explicit `tools.ytdlp_path` wins,
    /// otherwise PATH is searched when `tools.search_path` is set.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        if let Some(path) = &config.tools.ytdlp_path {
            return Ok(Self::new(path.clone(), &config.download));
        }

        if config.tools.search_path {
            return Self::from_path(&config.download).ok_or_else(|| {
                FetchError::ToolUnavailable(format!("{YTDLP_BINARY} not found in PATH"))
            });
        }

        Err(FetchError::ToolUnavailable(format!(
            "no {YTDLP_BINARY} path configured and PATH search disabled"
        )))
    }

    /// Path of the binary this fetcher runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn download_args(&self, source_url: &str, output_template: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
        ];

        if self.write_subtitles {
            args.push("--write-subs".to_string());
        } else {
            args.push("--no-write-subs".to_string());
            args.push("--no-write-auto-subs".to_string());
        }

        args.extend([
            "-o".to_string(),
            output_template.to_string_lossy().to_string(),
            source_url.to_string(),
        ]);
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> FetchError {
        FetchError::Spawn {
            tool: self.binary_path.clone(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        source_url: &str,
        output_template: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<FetchedMedia, FetchError> {
        if let Some(parent) = output_template.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut child = Command::new(&self.binary_path)
            .args(self.download_args(source_url, output_template))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Other("yt-dlp stdout not captured".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::Other("yt-dlp stderr not captured".into()))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        let mut file_path: Option<PathBuf> = None;
        let mut saw_finished = false;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(event) = parse_progress_line(line) {
                saw_finished |= event.phase == ProgressPhase::Finished;
                on_progress(event);
            } else if let Some(path) = parse_output_path(line) {
                file_path = Some(path);
            } else {
                tracing::trace!(line, "yt-dlp output");
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(FetchError::ExitStatus {
                tool: YTDLP_BINARY.to_string(),
                status: status.to_string(),
                stderr: stderr_tail(&stderr_text),
            });
        }

        if !saw_finished {
            let mut event = ProgressEvent::finished();
            if let Some(path) = &file_path {
                event = event.with_filename(path.to_string_lossy());
            }
            on_progress(event);
        }

        Ok(FetchedMedia { file_path })
    }

    async fn list_formats(&self, source_url: &str) -> Result<String, FetchError> {
        let output = Command::new(&self.binary_path)
            .args(["-F", "--no-playlist", source_url])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(FetchError::ExitStatus {
                tool: YTDLP_BINARY.to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Parse one line produced by [`PROGRESS_TEMPLATE`].
///
/// Unknown sizes (`NA`) become 0; the total falls back to yt-dlp's estimate.
/// Statuses other than `downloading`/`finished` are ignored.
fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.splitn(5, '|');

    let status = fields.next()?;
    let downloaded = parse_bytes(fields.next()?);
    let total = parse_bytes(fields.next()?);
    let estimate = parse_bytes(fields.next().unwrap_or("NA"));
    let filename = fields
        .next()
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != "NA");

    let total = if total > 0 { total } else { estimate };
    let event = match status {
        "downloading" => ProgressEvent::downloading(downloaded, total),
        "finished" => ProgressEvent {
            downloaded_bytes: downloaded,
            total_bytes: total,
            ..ProgressEvent::finished()
        },
        _ => return None,
    };

    Some(match filename {
        Some(f) => event.with_filename(f),
        None => event,
    })
}

fn parse_bytes(field: &str) -> u64 {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0)
}

/// Extract the final output path from yt-dlp's informational lines.
fn parse_output_path(line: &str) -> Option<PathBuf> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into ") {
        return Some(PathBuf::from(rest.trim_matches('"')));
    }
    if let Some(rest) = line.strip_prefix("[download] Destination: ") {
        return Some(PathBuf::from(rest));
    }
    line.strip_prefix("[download] ")
        .and_then(|rest| rest.strip_suffix(" has already been downloaded"))
        .map(PathBuf::from)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
