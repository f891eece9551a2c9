mod config;
mod server;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use credscan_core::{
    build_client, render_result, AnalysisRequest, AnalysisResult, CredibilityAnalyzer, Lookups,
    OutputFormat, SubmissionSession, SubmitError,
};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

const HEALTH_PROMPT: &str = "Reply with the single word OK.";

#[derive(Parser, Debug)]
#[command(
    name = "credscan",
    author,
    version,
    about = "Business credibility scoring backed by a language model"
)]
struct Cli {
    /// Optional TOML/YAML/JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default command)
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Analyze a single business and print the result
    Analyze(AnalyzeArgs),
    /// Read JSON requests line by line from stdin, reusing recent results
    Session {
        /// Emit one JSON object per line instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Check that the configured completion provider answers
    Health,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(long)]
    business_name: String,
    #[arg(long)]
    domain: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    facebook_url: Option<String>,
    #[arg(long)]
    instagram_url: Option<String>,
    #[arg(long)]
    hashtags: Option<String>,
    /// Emit the result as JSON
    #[arg(long)]
    json: bool,
}

impl From<AnalyzeArgs> for AnalysisRequest {
    fn from(args: AnalyzeArgs) -> Self {
        Self {
            business_name: args.business_name,
            domain: args.domain,
            email: args.email,
            phone: args.phone,
            address: args.address,
            facebook_url: args.facebook_url,
            instagram_url: args.instagram_url,
            hashtags: args.hashtags,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::run(&config.server, build_analyzer(&config)?).await?
        }
        Commands::Analyze(args) => analyze_once(&config, args).await?,
        Commands::Session { json } => run_session(&config, json).await?,
        Commands::Health => health(&config).await?,
    }
    Ok(())
}

fn build_analyzer(config: &AppConfig) -> Result<CredibilityAnalyzer> {
    let client = build_client(&config.llm).context("failed to configure completion provider")?;
    let lookups = Lookups::from_settings(&config.lookups)?;
    Ok(CredibilityAnalyzer::new(client).with_lookups(lookups))
}

async fn analyze_once(config: &AppConfig, args: AnalyzeArgs) -> Result<()> {
    let json = args.json;
    let analyzer = build_analyzer(config)?;
    let result = analyzer.analyze(args.into()).await?;
    print_result(&result, json, false)
}

async fn run_session(config: &AppConfig, json: bool) -> Result<()> {
    let mut session = SubmissionSession::new(build_analyzer(config)?, &config.cache);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sweep = tokio::time::interval(config.sweep_interval);
    sweep.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                submit_line(&mut session, &line, json).await?;
            }
            _ = sweep.tick() => {
                session.sweep();
            }
        }
    }
    Ok(())
}

async fn submit_line(session: &mut SubmissionSession, line: &str, json: bool) -> Result<()> {
    let request: AnalysisRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => return print_error(&format!("invalid request: {err}"), None, json),
    };
    match session.submit(request).await {
        Ok(submission) => {
            let cached = submission.is_cached();
            print_result(&submission.into_result(), json, cached)
        }
        Err(err) => {
            let retry_after = match &err {
                SubmitError::Throttled { retry_after } => Some(*retry_after),
                _ => None,
            };
            print_error(&err.to_string(), retry_after, json)
        }
    }
}

fn print_result(result: &AnalysisResult, json: bool, cached: bool) -> Result<()> {
    if json {
        println!("{}", json!({ "cached": cached, "result": result }));
        return Ok(());
    }
    if cached {
        println!("{}", "(served from recent results)".dimmed());
    }
    println!("{}", status_banner(result));
    print!("{}", render_result(result, OutputFormat::Human)?);
    Ok(())
}

fn print_error(message: &str, retry_after: Option<Duration>, json: bool) -> Result<()> {
    if json {
        let mut body = json!({ "error": message });
        if let Some(wait) = retry_after {
            body["retryAfterSecs"] = json!(wait.as_secs().max(1));
        }
        println!("{body}");
    } else {
        println!("{} {}", "error:".red().bold(), message);
    }
    Ok(())
}

fn status_banner(result: &AnalysisResult) -> ColoredString {
    let text = result.legitimacy.description().bold();
    if result.legitimacy.is_warning() {
        text.red()
    } else {
        text.green()
    }
}

async fn health(config: &AppConfig) -> Result<()> {
    println!("Checking provider {}", config.llm.provider);
    let client = build_client(&config.llm).context("failed to configure completion provider")?;
    client
        .complete(HEALTH_PROMPT)
        .await
        .with_context(|| format!("provider {} did not respond", config.llm.provider))?;
    println!("{}", "ok".green());
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
