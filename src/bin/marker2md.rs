//! CLI binary for edgequake-marker.
//!
//! A thin shim over the library crate: maps CLI flags to `ClientConfig` and
//! `ConversionRequest`, runs the conversion with a live spinner, then shows
//! the Markdown and writes the zip bundle.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_marker::{
    convert, markdown_file_name, write_atomic, write_atomic_async, ApiKey, CancellationToken,
    ClientConfig, ConversionRequest, ConversionResult, JobStatus, MarkerClient,
    PollProgressCallback, ProgressCallback, SessionState, DEFAULT_API_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner that shows the job's latest status
/// and how many checks have been spent.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Uploading");
        bar.set_message("sending PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl PollProgressCallback for CliProgressCallback {
    fn on_submitted(&self, file_name: &str, _check_url: &str) {
        self.bar
            .println(format!("  {} Uploaded {}", green("✓"), bold(file_name)));
        self.bar.set_prefix("Converting");
        self.bar.set_message("waiting for the job to start…");
    }

    fn on_attempt(&self, attempt: u32, max_attempts: u32, status: &JobStatus) {
        self.bar.set_message(format!(
            "status: {}  {}",
            status.status.as_deref().unwrap_or("?"),
            dim(&format!("check {attempt}/{max_attempts}"))
        ));
    }

    fn on_complete(&self, attempts: u32, markdown_len: usize, image_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Conversion successful!  {}",
            green("✔"),
            dim(&format!(
                "{markdown_len} chars, {image_count} images, {attempts} status checks"
            ))
        );
    }

    fn on_failed(&self, error: &str) {
        self.bar.finish_and_clear();
        // First line only; main prints the full error chain on exit.
        let first_line = error.lines().next().unwrap_or(error);
        eprintln!("{} {}", red("✘"), red(first_line));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert and write report.zip (Markdown + images) next to the PDF
  marker2md report.pdf

  # Choose the bundle location and also print the Markdown
  marker2md report.pdf -o out/report.zip --print

  # OCR in specific languages, paginated output
  marker2md scan.pdf --langs "English,German" --force-ocr --paginate

  # Write loose files instead of (or in addition to) the zip
  marker2md report.pdf --extract out/report/ --no-zip

  # Structured output
  marker2md report.pdf --json > report.json

ENVIRONMENT VARIABLES:
  DATALAB_API_KEY         Datalab API key (required)
  MARKER2MD_API_URL       Override the submission endpoint
  RUST_LOG                Override log filtering (e.g. edgequake_marker=debug)
"#;

/// Convert PDF files to Markdown through the Datalab marker API.
#[derive(Parser, Debug)]
#[command(
    name = "marker2md",
    version,
    about = "Convert PDF files to Markdown through the Datalab marker API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Datalab API key.
    #[arg(long, env = "DATALAB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Languages, comma-separated (e.g. "English,German").
    #[arg(long, env = "MARKER2MD_LANGS", default_value = "")]
    langs: String,

    /// Force OCR on every page.
    #[arg(long, env = "MARKER2MD_FORCE_OCR")]
    force_ocr: bool,

    /// Paginate the Markdown output.
    #[arg(long, env = "MARKER2MD_PAGINATE")]
    paginate: bool,

    /// Write the zip bundle here. Default: <input stem>.zip next to the input.
    #[arg(short, long, env = "MARKER2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Do not write the zip bundle.
    #[arg(long, conflicts_with = "output")]
    no_zip: bool,

    /// Also write <stem>.md and every image as loose files into this directory.
    #[arg(long, env = "MARKER2MD_EXTRACT")]
    extract: Option<PathBuf>,

    /// Print the Markdown to stdout.
    #[arg(long)]
    print: bool,

    /// Print the full result as JSON to stdout.
    #[arg(long, conflicts_with = "print")]
    json: bool,

    /// Submission endpoint.
    #[arg(long, env = "MARKER2MD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Delay between status checks, in milliseconds.
    #[arg(long, env = "MARKER2MD_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Maximum number of status checks before giving up.
    #[arg(long, env = "MARKER2MD_MAX_POLLS", default_value_t = 300)]
    max_polls: u32,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "MARKER2MD_REQUEST_TIMEOUT", default_value_t = 60)]
    request_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "MARKER2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MARKER2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MARKER2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; verbose mode always gets everything.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Required inputs ──────────────────────────────────────────────────
    let api_key = ApiKey::new(cli.api_key.clone().unwrap_or_default());
    if api_key.is_empty() || !cli.input.is_file() {
        eprintln!(
            "{} Please provide a PDF file and an API key (--api-key or DATALAB_API_KEY).",
            yellow("⚠")
        );
        std::process::exit(2);
    }

    let request = ConversionRequest::from_path(&cli.input, api_key)
        .await
        .context("Failed to read input")?
        .languages_csv(&cli.langs)
        .force_ocr(cli.force_ocr)
        .paginate(cli.paginate);

    // ── Client ───────────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PollProgressCallback>)
    } else {
        None
    };
    let client = MarkerClient::new(build_config(&cli, progress_cb)?)?;

    // Ctrl-C cancels the poll instead of killing the process mid-request.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let mut session = SessionState::new();
    let result = convert(&client, &request, &mut session, &cancel)
        .await
        .context("Conversion failed")?;

    // ── Preview ──────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(result).context("Failed to serialise result")?;
        println!("{json}");
    } else if cli.print {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(result.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !result.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if let Some(ref dir) = cli.extract {
        extract_files(result, request.file_name(), dir)?;
        if !cli.quiet {
            eprintln!("{} Extracted files into {}", green("✔"), bold(&dir.display().to_string()));
        }
    }

    // ── Download ─────────────────────────────────────────────────────────
    if !cli.no_zip {
        if let Some(download) = session.download() {
            let download = download.context("Failed to build zip bundle")?;
            let path = cli
                .output
                .clone()
                .unwrap_or_else(|| default_output(&cli.input, &download.file_name));
            let len = download.bytes.len();
            write_atomic_async(path.clone(), download.bytes).await?;
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&path.display().to_string()),
                    dim(&format!("{len} bytes"))
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .api_url(cli.api_url.clone())
        .poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .max_polls(cli.max_polls)
        .request_timeout_secs(cli.request_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `<dir of input>/<bundle name>`.
fn default_output(input: &Path, bundle_name: &str) -> PathBuf {
    input
        .parent()
        .map(|p| p.join(bundle_name))
        .unwrap_or_else(|| PathBuf::from(bundle_name))
}

/// Write the Markdown and every image as separate files.
///
/// Image names come from the remote service; only their final path
/// component is used so they cannot escape `dir`.
fn extract_files(result: &ConversionResult, source_name: &str, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let md_path = dir.join(markdown_file_name(source_name));
    write_atomic(&md_path, result.markdown.as_bytes())?;

    for (name, bytes) in result.decoded_images()? {
        let Some(file_name) = Path::new(name).file_name() else {
            tracing::warn!("Skipping image with unusable name '{}'", name);
            continue;
        };
        write_atomic(&dir.join(file_name), &bytes)?;
    }
    Ok(())
}
