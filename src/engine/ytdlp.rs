//! yt-dlp as a [`DownloadEngine`].

use super::{DownloadEngine, DownloadRequest, EngineOutput, ProgressCallback};
use crate::error::{ClipwiseError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// stderr fragments meaning the media itself cannot be fetched.
const UNAVAILABLE_MARKERS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video is not available",
    "has been removed",
    "No video could be found",
];

/// Runs the yt-dlp binary.
#[derive(Debug)]
pub struct YtDlp {
    binary: String,
    ready: AtomicBool,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ready: AtomicBool::new(false),
        }
    }

    /// Check the binary runs and mark the engine ready. Returns its version.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<String> {
        let result = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipwiseError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => return Err(ClipwiseError::Io(e)),
        };

        if !output.status.success() {
            return Err(ClipwiseError::EngineNotReady(format!(
                "{} --version failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("yt-dlp {} ready", version);
        self.ready.store(true, Ordering::Release);
        Ok(version)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl DownloadEngine for YtDlp {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    #[instrument(skip(self, request, progress), fields(url = %request.url))]
    async fn execute(&self, request: &DownloadRequest, progress: Option<ProgressCallback<'_>>) -> Result<EngineOutput> {
        if !self.is_ready() {
            return Err(ClipwiseError::EngineNotReady("yt-dlp has not been initialized".into()));
        }

        let mut args = request.to_args();
        if progress.is_some() && !request.has_flag("--newline") {
            // One progress update per line instead of carriage-return redraws.
            args.insert(0, "--newline".to_string());
        }
        debug!("yt-dlp {:?}", args);

        let spawned = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipwiseError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => return Err(ClipwiseError::Io(e)),
        };

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut buf).await {
                    debug!("yt-dlp stderr read stopped: {}", e);
                }
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let mut stdout = String::new();
        if let Some(out) = child.stdout.take() {
            let mut last_ratio = 0.0;
            let read = read_lines_lossy(BufReader::new(out), |line| {
                if let Some(callback) = progress {
                    if line.starts_with("[download]") {
                        let ratio = super::normalize_progress(last_ratio, Some(line));
                        last_ratio = ratio;
                        callback(ratio, Some(line));
                    }
                }
                stdout.push_str(line);
                stdout.push('\n');
            })
            .await;

            if let Err(e) = read {
                if let Err(kill_err) = child.kill().await {
                    warn!("Failed to stop yt-dlp: {}", kill_err);
                }
                return Err(ClipwiseError::Io(e));
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let message = stderr.trim().to_string();
            warn!("yt-dlp failed: {}", message);
            if UNAVAILABLE_MARKERS.iter().any(|m| message.contains(m)) {
                return Err(ClipwiseError::MediaUnavailable(message));
            }
            return Err(ClipwiseError::DownloadFailed(format!("yt-dlp failed: {message}")));
        }

        Ok(EngineOutput { stdout })
    }
}

/// Feed each line to `on_line`, replacing invalid UTF-8 instead of failing.
async fn read_lines_lossy<R>(mut reader: R, mut on_line: impl FnMut(&str)) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(line.trim_end_matches(['\r', '\n']));
    }
}
