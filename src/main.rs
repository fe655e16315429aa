use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use pdf_squeeze::{
    compress, Callbacks, CompressionLevel, CompressionMode, CompressionRequest,
    CompressionResult, ConvergenceOptions, ExhaustionPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Rewrite the document in process
    InProcess,
    /// Run an external Ghostscript binary
    Engine,
}

/// Size-targeting PDF compressor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input PDF file
    input: PathBuf,

    /// Output PDF file
    output: PathBuf,

    /// Compression level (EXTREME, HIGH, MEDIUM, LOW, PREPRESS)
    #[arg(long, default_value_t = CompressionLevel::Medium)]
    level: CompressionLevel,

    /// Byte budget, e.g. 250000, 500K or 2MB. Overrides --level
    #[arg(long, value_parser = parse_size)]
    target_size: Option<u64>,

    #[arg(long, value_enum, default_value_t = BackendArg::InProcess)]
    backend: BackendArg,

    /// Passes before giving up on the target
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Floor of the decaying quality factor
    #[arg(long)]
    min_quality: Option<f32>,

    /// Image scale factor applied after each missed pass
    #[arg(long)]
    resolution_multiplier: Option<f32>,

    /// What to do when every pass misses: fail or fallback
    #[arg(long)]
    on_exhaustion: Option<ExhaustionPolicy>,

    /// Encode images losslessly while the quality stays above this
    #[arg(long)]
    lossless_above: Option<f32>,

    /// Ghostscript executable used by the engine backend
    #[arg(long, env = "PDF_SQUEEZE_GS", default_value = "gs")]
    gs_binary: PathBuf,

    /// Abort the engine backend after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// More output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Parses a byte count with an optional K/KB/M/MB suffix (powers of 1024).
fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let (number, multiplier) = if let Some(n) = upper.strip_suffix("MB").or(upper.strip_suffix('M')) {
        (n, 1024.0 * 1024.0)
    } else if let Some(n) = upper.strip_suffix("KB").or(upper.strip_suffix('K')) {
        (n, 1024.0)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1.0)
    } else {
        (upper.as_str(), 1.0)
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{}'", s))?;
    let bytes = (value * multiplier).round();
    if !bytes.is_finite() || bytes < 1.0 {
        return Err(format!("size must be at least one byte, got '{}'", s));
    }
    Ok(bytes as u64)
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

impl Args {
    fn options(&self) -> ConvergenceOptions {
        let mut options = ConvergenceOptions::default();
        if let Some(n) = self.max_attempts {
            options = options.with_max_attempts(n);
        }
        if let Some(q) = self.min_quality {
            options = options.with_min_quality(q);
        }
        if let Some(m) = self.resolution_multiplier {
            options = options.with_image_resolution_multiplier(m);
        }
        if let Some(policy) = self.on_exhaustion {
            options = options.with_exhaustion_policy(policy);
        }
        if let Some(t) = self.lossless_above {
            options = options.with_lossless_above(t);
        }
        options
    }

    fn mode(&self) -> CompressionMode {
        match self.target_size {
            Some(target_size_bytes) => CompressionMode::Custom { target_size_bytes },
            None => CompressionMode::Preset(self.level),
        }
    }
}

fn callbacks<'a>() -> Callbacks<'a> {
    Callbacks::none().on_status(|s| log::info!("{}", s))
}

#[cfg(not(target_arch = "wasm32"))]
fn run_engine(args: &Args, request: CompressionRequest) -> Result<CompressionResult> {
    use pdf_squeeze::engine::{EngineJob, EngineOutcome, GhostscriptEngine};

    let engine = GhostscriptEngine::new(&args.gs_binary);
    let job = EngineJob::new(request)?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let outcome = runtime.block_on(async {
        let mut callbacks = callbacks();
        match args.timeout_secs {
            Some(secs) => tokio::time::timeout(
                Duration::from_secs(secs),
                engine.run(job, &mut callbacks),
            )
            .await
            .with_context(|| format!("Engine timed out after {}s", secs)),
            None => Ok(engine.run(job, &mut callbacks).await),
        }
    })?;
    match outcome {
        EngineOutcome::Completed(result) => Ok(result),
        EngineOutcome::Failed { message } => bail!("Engine failed: {}", message),
    }
}

#[cfg(target_arch = "wasm32")]
fn run_engine(_args: &Args, _request: CompressionRequest) -> Result<CompressionResult> {
    bail!("The engine backend is not available on this target")
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(log_level(args.verbose))
        .parse_default_env()
        .init();

    println!("Loading PDF: {:?}", args.input);
    let source = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let original_size = source.len() as u64;
    let request = CompressionRequest::new(source, args.mode());

    let start = Instant::now();
    let result = match args.backend {
        BackendArg::InProcess => compress(&request, &args.options(), &mut callbacks())
            .context("Compression failed")?,
        BackendArg::Engine => run_engine(&args, request)?,
    };
    println!(
        "Compressed with {} backend in {:.2?} ({} passes)",
        result.backend,
        start.elapsed(),
        result.attempts
    );

    std::fs::write(&args.output, &result.output_bytes)
        .with_context(|| format!("Failed to write {:?}", args.output))?;

    println!("Original size: {:.2} MB", original_size as f64 / 1_048_576.0);
    println!(
        "New size:      {:.2} MB",
        result.final_size_bytes as f64 / 1_048_576.0
    );
    if !result.target_reached {
        println!(
            "Target of {} bytes not reached (got {} bytes)",
            result.target_size_bytes, result.final_size_bytes
        );
    }

    Ok(())
}
