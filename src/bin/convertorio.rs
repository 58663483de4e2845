//! CLI binary for convertorio.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig` / `ConversionRequest` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use convertorio::{
    AspectRatio, CancellationToken, Client, ClientConfig, ConversionEvent, ConversionOptions,
    ConversionRequest, CropStrategy, EventKind, IconSize, JobStatus, ListJobsQuery,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}";

const AFTER_HELP: &str = r#"EXAMPLES:
  # PNG → JPG next to the input (photo.jpg)
  convertorio convert photo.png --to jpg

  # WebP, 16:9 centre crop, quality 90, explicit output
  convertorio convert photo.jpg --to webp --aspect-ratio 16:9 \
      --crop-strategy crop-center --quality 90 -o out/photo.webp

  # Favicon
  convertorio convert logo.png --to ico --icon-size 32

  # Account and recent jobs
  convertorio account
  convertorio jobs --limit 10 --status failed
  convertorio job 7f0c2d1e --json

ENVIRONMENT VARIABLES:
  CONVERTORIO_API_KEY     API key (https://convertorio.com/account)
  CONVERTORIO_BASE_URL    Override the API endpoint
  RUST_LOG                Override log filtering (e.g. convertorio=debug)
"#;

/// Convert files with the Convertorio API.
#[derive(Parser, Debug)]
#[command(
    name = "convertorio",
    version,
    about = "Convert images and documents with the Convertorio API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// API key.
    #[arg(long, env = "CONVERTORIO_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API base URL.
    #[arg(long, env = "CONVERTORIO_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Output structured JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CONVERTORIO_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CONVERTORIO_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a local file.
    Convert(ConvertArgs),
    /// Show account plan and quota.
    Account,
    /// List recent jobs.
    Jobs {
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// pending, processing, completed, failed, expired.
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one job.
    Job { id: String },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local file to convert.
    input: PathBuf,

    /// Target format (jpg, png, webp, avif, ico, pdf, …).
    #[arg(short, long = "to")]
    to: String,

    /// Write the result here instead of next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compression quality 1–100.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// original, 1:1, 4:3, 16:9, 9:16, 21:9, custom.
    #[arg(long)]
    aspect_ratio: Option<String>,

    /// fit, crop-center, crop-top, crop-bottom, crop-left, crop-right.
    #[arg(long)]
    crop_strategy: Option<String>,

    /// Target width in pixels (1–10000).
    #[arg(long)]
    resize_width: Option<u32>,

    /// Target height in pixels (1–10000).
    #[arg(long)]
    resize_height: Option<u32>,

    /// ICO edge length: 16, 32, 48, 64, 128, 256.
    #[arg(long)]
    icon_size: Option<u32>,

    /// Maximum job-status polls.
    #[arg(long, env = "CONVERTORIO_MAX_ATTEMPTS", default_value_t = 120)]
    max_attempts: u32,

    /// Seconds between job-status polls.
    #[arg(long, env = "CONVERTORIO_POLL_INTERVAL", default_value_t = 2.0)]
    poll_interval: f64,

    /// Disable the progress spinner.
    #[arg(long, env = "CONVERTORIO_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports every step; keep library INFO logs out of
    // its way unless the user asked for verbose output.
    let spinner_active = matches!(&cli.command, Command::Convert(a) if !a.no_progress)
        && !g.quiet
        && !g.json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || spinner_active {
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

    match &cli.command {
        Command::Convert(args) => run_convert(g, args, spinner_active).await,
        Command::Account => {
            let client = build_client(g, None)?;
            let account = client.get_account().await.context("Failed to fetch account")?;
            if g.json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                println!("Account:      {} <{}>", account.name, account.email);
                println!("Plan:         {}", account.plan);
                println!("Points:       {}", account.points);
                println!("Daily left:   {}", account.daily_conversions_remaining);
                println!("Conversions:  {}", account.total_conversions);
            }
            Ok(())
        }
        Command::Jobs {
            limit,
            offset,
            status,
        } => {
            let client = build_client(g, None)?;
            let status = status
                .as_deref()
                .map(str::parse::<JobStatus>)
                .transpose()
                .context("Invalid --status")?;
            let jobs = client
                .list_jobs(&ListJobsQuery {
                    limit: *limit,
                    offset: *offset,
                    status,
                })
                .await
                .context("Failed to list jobs")?;
            if g.json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else {
                for job in &jobs {
                    println!(
                        "{:<38} {:<11} {} → {}",
                        job.id,
                        job.status.to_string(),
                        job.source_format.as_deref().unwrap_or("?"),
                        job.target_format.as_deref().unwrap_or("?"),
                    );
                }
                if jobs.is_empty() && !g.quiet {
                    eprintln!("{}", dim("no jobs"));
                }
            }
            Ok(())
        }
        Command::Job { id } => {
            let client = build_client(g, None)?;
            let job = client.get_job(id).await.context("Failed to fetch job")?;
            if g.json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                println!("Job:          {}", job.id);
                println!("Status:       {}", job.status);
                if let Some(ref f) = job.original_filename {
                    println!("File:         {}", f);
                }
                if let Some(ms) = job.processing_time_ms {
                    println!("Processing:   {}ms", ms);
                }
                if let Some(ref url) = job.download_url {
                    println!("Download:     {}", url);
                }
                if job.status.is_terminal() && job.status != JobStatus::Completed {
                    println!("Error:        {}", red(&job.failure_message()));
                }
            }
            Ok(())
        }
    }
}

async fn run_convert(g: &GlobalArgs, args: &ConvertArgs, spinner_active: bool) -> Result<()> {
    let mut client = build_client(g, Some(args))?;
    let request = build_request(args)?;

    let spinner = spinner_active.then(|| {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    if let Some(ref bar) = spinner {
        let b = bar.clone();
        client.on(EventKind::Start, move |e| {
            if let ConversionEvent::Start(s) = e {
                b.set_prefix(format!("{} → {}", s.file_name, s.target_format));
            }
        });
        let b = bar.clone();
        client.on(EventKind::Progress, move |e| {
            if let ConversionEvent::Progress(p) = e {
                b.set_message(p.message);
            }
        });
        let b = bar.clone();
        client.on(EventKind::Status, move |e| {
            if let ConversionEvent::Status(s) = e {
                b.set_message(format!("Converting (poll {}/{})", s.attempt, s.max_attempts));
            }
        });
    }

    // Ctrl-C cancels the conversion cleanly instead of killing mid-write.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let outcome = client.convert_with_cancel(&request, &cancel).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let result = outcome.context("Conversion failed")?;

    if g.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !g.quiet {
        eprintln!(
            "{}  {}  {}  {}",
            green("✔"),
            bold(&result.output_path.display().to_string()),
            dim(&format!("{} bytes", result.file_size)),
            dim(&format!("{}ms server-side", result.processing_time_ms)),
        );
    }
    Ok(())
}

/// Map CLI args to a `Client`.
fn build_client(g: &GlobalArgs, convert: Option<&ConvertArgs>) -> Result<Client> {
    let api_key = g
        .api_key
        .clone()
        .context("No API key: pass --api-key or set CONVERTORIO_API_KEY")?;
    let mut builder = ClientConfig::builder(api_key);
    if let Some(ref url) = g.base_url {
        builder = builder.base_url(url);
    }
    if let Some(args) = convert {
        builder = builder
            .max_attempts(args.max_attempts)
            .poll_interval(poll_interval(args.poll_interval)?);
    }
    let config = builder.build().context("Invalid configuration")?;
    Client::new(config).context("Failed to create client")
}

/// `--poll-interval` seconds as a `Duration`; rejects negative, NaN and
/// out-of-range values instead of panicking.
fn poll_interval(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Invalid --poll-interval {secs}: expected seconds >= 0"))
}

/// Map CLI args to a `ConversionRequest`.
fn build_request(args: &ConvertArgs) -> Result<ConversionRequest> {
    let mut options = ConversionOptions {
        quality: args.quality,
        resize_width: args.resize_width,
        resize_height: args.resize_height,
        ..ConversionOptions::default()
    };
    if let Some(ref s) = args.aspect_ratio {
        options.aspect_ratio = Some(s.parse::<AspectRatio>().context("Invalid --aspect-ratio")?);
    }
    if let Some(ref s) = args.crop_strategy {
        options.crop_strategy = Some(s.parse::<CropStrategy>().context("Invalid --crop-strategy")?);
    }
    if let Some(px) = args.icon_size {
        options.icon_size = Some(IconSize::try_from(px).context("Invalid --icon-size")?);
    }

    let mut request = ConversionRequest::new(&args.input, &args.to).options(options);
    if let Some(ref out) = args.output {
        request = request.output_path(out);
    }
    request.validate().context("Invalid request")?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_accepts_fractional_seconds() {
        assert_eq!(poll_interval(0.25).unwrap(), Duration::from_millis(250));
        assert_eq!(poll_interval(0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn poll_interval_rejects_out_of_range() {
        for bad in [1e30, -1.0, f64::NAN, f64::INFINITY] {
            let err = poll_interval(bad).unwrap_err();
            assert!(err.to_string().contains("--poll-interval"), "{bad}: {err}");
        }
    }
}
