use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use urltitle_core::{ConfigLoader, ErrorKind, UrlTitleConfig, UrlTitleError, UrlTitleReader, netloc_with_webcache};

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve URLs to their titles
#[derive(Parser, Debug)]
#[command(name = "urltitle")]
#[command(author = "urltitle Contributors")]
#[command(version)]
#[command(about = "Resolve URLs to their page, PDF or notebook titles", long_about = None)]
struct Args {
    /// URLs to resolve; a missing scheme is guessed
    #[arg(value_name = "URL", required_unless_present = "completions")]
    urls: Vec<String>,

    /// Print one JSON object per URL
    #[arg(long)]
    json: bool,

    /// Print normalized hosts instead of titles, without network access
    #[arg(long)]
    netloc: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "15", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Directory of per-host override files (<host>.txt)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Ignore the built-in site overrides
    #[arg(long)]
    no_builtin: bool,

    /// Attempts per request, including the first
    #[arg(long, default_value = "3", value_name = "NUM")]
    attempts: u32,

    /// Webcache mirror prefix; empty disables the mirror
    #[arg(long, value_name = "PREFIX")]
    webcache_prefix: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct TitleRecord {
    url: String,
    netloc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl TitleRecord {
    fn new(url: String, netloc: String, result: Result<String, UrlTitleError>) -> Self {
        match result {
            Ok(title) => Self { url, netloc, title: Some(title), error: None, kind: None },
            Err(e) => {
                let kind = match e.kind() {
                    ErrorKind::Unrecoverable => "unrecoverable",
                    ErrorKind::RetryExhausted => "retry_exhausted",
                };
                Self { url, netloc, title: None, error: Some(e.to_string()), kind: Some(kind) }
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,urltitle_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn build_config(args: &Args) -> anyhow::Result<UrlTitleConfig> {
    let mut builder = UrlTitleConfig::builder()
        .request_timeout(Duration::from_secs(args.timeout))
        .max_attempts(args.attempts)
        .verify_tls(!args.insecure);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    if let Some(prefix) = &args.webcache_prefix {
        builder = builder.webcache_prefix(prefix.clone());
    }
    builder.try_build().context("Invalid settings")
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = build_config(&args)?;

    if args.netloc {
        for url in &args.urls {
            let host = netloc_with_webcache(url, &config.webcache_prefix);
            if args.json {
                let record = serde_json::json!({ "url": url, "netloc": host });
                println!("{}", record);
            } else {
                println!("{}", host);
            }
        }
        return Ok(true);
    }

    let mut loader = ConfigLoader::builder().builtin(!args.no_builtin);
    if let Some(dir) = args.config_dir.clone().or_else(ConfigLoader::default_custom_dir) {
        loader = loader.custom_dir(dir);
    }
    let overrides = loader.build().load().context("Failed to load site overrides")?;

    if args.verbose {
        echo::print_banner();
        echo::print_info(&format!("Loaded site overrides for {} hosts", overrides.len()));
    }

    let reader = Arc::new(UrlTitleReader::with_overrides(config, overrides));
    let handles: Vec<_> = args
        .urls
        .iter()
        .cloned()
        .map(|url| {
            let reader = Arc::clone(&reader);
            tokio::spawn(async move {
                let started = Instant::now();
                let result = reader.title(&url).await;
                (url, result, started.elapsed())
            })
        })
        .collect();

    let mut all_ok = true;
    for handle in handles {
        let (url, result, elapsed) = handle.await.context("Title task panicked")?;
        if args.verbose {
            echo::print_timing(&url, elapsed);
        }
        all_ok &= result.is_ok();

        if args.json {
            let host = reader.netloc(&url);
            let record = TitleRecord::new(url, host, result);
            println!("{}", serde_json::to_string(&record).context("Failed to serialize result")?);
            continue;
        }
        match result {
            Ok(title) => println!("{}", title),
            Err(e) => echo::print_error(&e.to_string()),
        }
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "urltitle", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            echo::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["urltitle", "--json", "--attempts", "5", "example.com", "python.org"]).unwrap();
        assert!(args.json);
        assert_eq!(args.attempts, 5);
        assert_eq!(args.urls, vec!["example.com", "python.org"]);
    }

    #[test]
    fn test_args_require_url() {
        assert!(Args::try_parse_from(["urltitle"]).is_err());
        assert!(Args::try_parse_from(["urltitle", "--completions", "bash"]).is_ok());
    }

    #[test]
    fn test_build_config() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "urltitle",
            "--timeout",
            "3",
            "--insecure",
            "--user-agent",
            "tester/1.0",
            "--webcache-prefix",
            "",
            "example.com",
        ])
        .unwrap();
        let config = build_config(&args)?;
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(!config.verify_tls);
        assert_eq!(config.user_agent, "tester/1.0");
        assert_eq!(config.webcache_prefix, "");
        Ok(())
    }

    #[test]
    fn test_build_config_rejects_zero_attempts() {
        let args = Args::try_parse_from(["urltitle", "--attempts", "0", "example.com"]).unwrap();
        let err = build_config(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("max_attempts"), "{:#}", err);
    }

    #[test]
    fn test_title_record_error() {
        let err = UrlTitleError::unrecoverable("https://example.com/x", "HTTP status 404 Not Found");
        let record = TitleRecord::new("https://example.com/x".into(), "example.com".into(), Err(err));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "unrecoverable");
        assert!(json.get("title").is_none());
    }
}
