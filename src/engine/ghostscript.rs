use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use anyhow::{bail, Context};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::args::{build_arguments, INPUT_FILE, OUTPUT_FILE};
use super::status::StatusThrottle;
use crate::convergence::{Backend, CompressionResult};
use crate::error::Result;
use crate::options::CompressionRequest;
use crate::progress::{Callbacks, Progress};

pub const DEFAULT_BINARY: &str = "gs";

/// One engine invocation for one request. [`GhostscriptEngine::run`] takes
/// it by value, so a job can only ever be started once.
#[derive(Debug)]
pub struct EngineJob {
    request: CompressionRequest,
    arguments: Vec<String>,
}

impl EngineJob {
    pub fn new(request: CompressionRequest) -> Result<Self> {
        request.validate()?;
        let arguments = build_arguments(&request.mode, request.original_size_bytes);
        Ok(Self { request, arguments })
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn request(&self) -> &CompressionRequest {
        &self.request
    }
}

#[derive(Debug)]
pub enum EngineOutcome {
    Completed(CompressionResult),
    Failed { message: String },
}

impl EngineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, EngineOutcome::Completed(_))
    }
}

/// Drives a Ghostscript-compatible executable through a scratch directory
/// holding `input.pdf` and `output.pdf`.
#[derive(Debug, Clone)]
pub struct GhostscriptEngine {
    binary: PathBuf,
}

impl Default for GhostscriptEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl GhostscriptEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Validates the request and runs it. Only an invalid request is an
    /// `Err`; everything the engine does wrong comes back as
    /// [`EngineOutcome::Failed`].
    pub async fn compress(
        &self,
        request: CompressionRequest,
        callbacks: &mut Callbacks<'_>,
    ) -> Result<EngineOutcome> {
        let job = EngineJob::new(request)?;
        Ok(self.run(job, callbacks).await)
    }

    /// Runs the job to completion. Dropping the returned future kills the
    /// child and removes the scratch directory.
    pub async fn run(&self, job: EngineJob, callbacks: &mut Callbacks<'_>) -> EngineOutcome {
        callbacks.progress(Progress::working());
        match self.execute(&job, callbacks).await {
            Ok(result) => {
                info!(
                    "Engine finished: {} -> {} bytes (target {})",
                    job.request.source_bytes.len(),
                    result.final_size_bytes,
                    result.target_size_bytes
                );
                callbacks.progress(Progress::determinate(1.0, 1.0));
                callbacks.status(&format!("Done: {} bytes", result.final_size_bytes));
                EngineOutcome::Completed(result)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!("Engine run failed: {}", message);
                callbacks.status(&format!("Error: {}", message));
                EngineOutcome::Failed { message }
            }
        }
    }

    async fn execute(
        &self,
        job: &EngineJob,
        callbacks: &mut Callbacks<'_>,
    ) -> anyhow::Result<CompressionResult> {
        let workdir = tempfile::tempdir().context("Failed to create engine directory")?;
        tokio::fs::write(workdir.path().join(INPUT_FILE), &job.request.source_bytes)
            .await
            .context("Failed to write engine input")?;

        debug!("{} {}", self.binary.display(), job.arguments.join(" "));
        let mut child = Command::new(&self.binary)
            .args(&job.arguments)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.binary.display()))?;

        let stdout = child.stdout.take().context("No stdout handle")?;
        let stderr = child.stderr.take().context("No stderr handle")?;
        // Split on raw bytes: engine output is not guaranteed to be UTF-8.
        let mut stdout_lines = BufReader::new(stdout).split(b'\n');
        let mut stderr_lines = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut throttle = StatusThrottle::new();

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout_lines.next_segment(), if stdout_open => match line? {
                    Some(line) => {
                        let line = String::from_utf8_lossy(&line);
                        throttle.deliver(line.trim_end(), Instant::now(), callbacks);
                    }
                    None => stdout_open = false,
                },
                line = stderr_lines.next_segment(), if stderr_open => match line? {
                    Some(line) => {
                        let line = String::from_utf8_lossy(&line);
                        warn!("engine: {}", line.trim_end());
                        callbacks.status(&format!("Error: {}", line.trim_end()));
                    }
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await.context("Failed to wait for engine")?;
        if !status.success() {
            bail!("{} exited with {}", self.binary.display(), status);
        }

        let output = tokio::fs::read(workdir.path().join(OUTPUT_FILE))
            .await
            .with_context(|| format!("Engine produced no {}", OUTPUT_FILE))?;
        if output.is_empty() {
            bail!("Engine produced an empty {}", OUTPUT_FILE);
        }

        Ok(CompressionResult::new(
            output,
            job.request.target_size_bytes(),
            1,
            Backend::ExternalEngine,
        ))
    }
}
