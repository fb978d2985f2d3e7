//! web2txt CLI - save a webpage as clean plain text

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use web2txt::{
    ConversionReport, FetchProgress, Pipeline, Prepared, ProgressSink, Stage, DEFAULT_TIMEOUT,
};

/// web2txt - fetch a webpage and save its readable text
#[derive(Parser, Debug)]
#[command(name = "web2txt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL to fetch (scheme defaults to https)
    url: String,

    /// Output file (derived from the URL when omitted)
    output: Option<String>,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Seconds allowed for connecting and downloading
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// No progress bar or informational lines
    #[arg(long, short)]
    quiet: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn pipeline(&self, bar: &ProgressBar, prepared: &Prepared) -> Pipeline {
        let mut builder = Pipeline::builder()
            .timeout(Duration::from_secs(self.timeout))
            .progress(BarProgress {
                bar: bar.clone(),
                notices: !self.quiet,
                target: prepared.target.to_string(),
            });
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
    };

    let prepared = match Prepared::new(&cli.url, cli.output.as_deref()) {
        Ok(prepared) => prepared,
        Err(e) => fail(&e.user_message()),
    };
    debug!(
        url = %prepared.source,
        output = %prepared.target,
        timeout_secs = cli.timeout,
        user_agent = cli.user_agent.as_deref().unwrap_or(web2txt::DEFAULT_USER_AGENT),
        json = cli.json,
        "Arguments parsed"
    );
    let pipeline = cli.pipeline(&bar, &prepared);

    if !cli.quiet {
        for line in info_lines(&prepared) {
            eprintln!("{}", line);
        }
    }

    let result = pipeline.execute(&prepared).await;
    bar.finish_and_clear();

    match result {
        Ok(report) if cli.json => match serde_json::to_string_pretty(&report) {
            Ok(json) => writeln_safe(&json),
            Err(e) => fail(&format!("Error serializing report: {}", e)),
        },
        Ok(report) => writeln_safe(&success_message(&prepared, &report)),
        Err(e) => fail(&e.user_message()),
    }
}

/// Drives an indicatif bar from fetch progress and prints stage notices
struct BarProgress {
    bar: ProgressBar,
    notices: bool,
    target: String,
}

impl ProgressSink for BarProgress {
    fn started(&self, total: Option<u64>) {
        match total {
            Some(len) => {
                self.bar.set_length(len);
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "{bar:40} {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
            }
            None => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
            }
        }
    }

    fn advanced(&self, progress: FetchProgress) {
        self.bar.set_position(progress.bytes_read);
    }

    fn finished(&self, _progress: FetchProgress) {
        self.bar.finish_and_clear();
    }

    fn stage(&self, stage: Stage) {
        if !self.notices {
            return;
        }
        if let Some(line) = stage_notice(stage, &self.target) {
            self.bar.suspend(|| eprintln!("{}", line));
        }
    }
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Log to stderr; RUST_LOG wins over -v
fn init_logging(verbose: u8) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn info_lines(prepared: &Prepared) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if prepared.target.is_derived() {
        lines.push(format!("Using default output filename: {}", prepared.target));
    }
    lines.push(format!("Fetching URL: {}...", prepared.source));
    lines
}

fn stage_notice(stage: Stage, target: &str) -> Option<String> {
    match stage {
        Stage::Fetched => Some("Parsing HTML content...".to_string()),
        Stage::Normalized => Some(format!("Saving text to {}...", target)),
        _ => None,
    }
}

fn success_message(prepared: &Prepared, report: &ConversionReport) -> String {
    format!(
        "Successfully saved text from {} to {} ({} bytes).",
        prepared.source, report.output, report.bytes_written
    )
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(output: &str, bytes: u64) -> ConversionReport {
        ConversionReport {
            url: "https://example.com/".to_string(),
            output: output.to_string(),
            bytes_written: bytes,
            status_code: 200,
            content_type: Some("text/html".to_string()),
            bytes_fetched: 512,
            encoding: "UTF-8".to_string(),
            lossy_decode: false,
            empty_content: false,
        }
    }

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["web2txt", "example.com"]).unwrap();
        assert_eq!(cli.url, "example.com");
        assert_eq!(cli.output, None);
        assert_eq!(cli.timeout, 15);
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "web2txt",
            "https://example.com/page",
            "page.txt",
            "--user-agent",
            "Bot/1.0",
            "--timeout",
            "30",
            "--json",
            "-q",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output.as_deref(), Some("page.txt"));
        assert_eq!(cli.user_agent.as_deref(), Some("Bot/1.0"));
        assert_eq!(cli.timeout, 30);
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_requires_url() {
        assert!(Cli::try_parse_from(["web2txt"]).is_err());
        assert!(Cli::try_parse_from(["web2txt", "example.com", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(2), "debug");
        assert_eq!(log_filter(7), "debug");
    }

    #[test]
    fn test_info_lines_derived_name() {
        let cli = Cli::try_parse_from(["web2txt", "example.com/docs"]).unwrap();
        let prepared = Prepared::new(&cli.url, None).unwrap();

        assert_eq!(
            info_lines(&prepared),
            vec![
                "Using default output filename: example_com_docs_content.txt".to_string(),
                "Fetching URL: https://example.com/docs...".to_string(),
            ]
        );
    }

    #[test]
    fn test_info_lines_explicit_name() {
        let prepared = Pipeline::default()
            .prepare("http://example.com", Some("out.txt"))
            .unwrap();
        assert_eq!(
            info_lines(&prepared),
            vec!["Fetching URL: http://example.com/...".to_string()]
        );
    }

    #[test]
    fn test_stage_notices() {
        assert_eq!(
            stage_notice(Stage::Fetched, "out.txt").as_deref(),
            Some("Parsing HTML content...")
        );
        assert_eq!(
            stage_notice(Stage::Normalized, "out.txt").as_deref(),
            Some("Saving text to out.txt...")
        );
        assert_eq!(stage_notice(Stage::Extracted, "out.txt"), None);
        assert_eq!(stage_notice(Stage::Written, "out.txt"), None);
    }

    #[test]
    fn test_pipeline_from_flags() {
        let cli = Cli::try_parse_from(["web2txt", "example.com", "--timeout", "3"]).unwrap();
        let prepared = Prepared::new(&cli.url, cli.output.as_deref()).unwrap();
        let pipeline = cli.pipeline(&ProgressBar::hidden(), &prepared);
        assert!(format!("{:?}", pipeline).contains("http"));
    }

    #[test]
    fn test_success_message() {
        let prepared = Pipeline::default()
            .prepare("example.com", Some("out.txt"))
            .unwrap();
        assert_eq!(
            success_message(&prepared, &report("out.txt", 42)),
            "Successfully saved text from https://example.com/ to out.txt (42 bytes)."
        );
    }

    #[test]
    fn test_invalid_url_message() {
        let err = Pipeline::default().prepare("   ", None).unwrap_err();
        assert!(err.user_message().starts_with("Error: Invalid URL. "));
    }

    #[test]
    fn test_bar_tracks_progress() {
        let bar = ProgressBar::hidden();
        let sink = BarProgress {
            bar: bar.clone(),
            notices: false,
            target: "out.txt".to_string(),
        };
        sink.started(Some(100));
        sink.advanced(FetchProgress::new(40, Some(100)));
        assert_eq!(bar.position(), 40);
        assert_eq!(bar.length(), Some(100));
        sink.finished(FetchProgress::new(100, Some(100)));
        assert!(bar.is_finished());
    }
}
