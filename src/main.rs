//! LLM Key Rotator demo
//!
//! Sends one prompt to every configured target, switching API keys whenever
//! a key is rate limited.

use anyhow::Result;
use clap::Parser;
use llm_key_rotator::{
    config::{Settings, DEFAULT_CONFIG_PATH},
    logging,
    schemas::openai::{ChatCompletionRequest, ChatMessage},
    services::{
        adapters::RotatingTarget,
        rotation::{ConsoleObserver, ExecutionEngine, ObserverSet, TracingObserver},
    },
};
use std::path::PathBuf;
use std::process::ExitCode;

/// LLM Key Rotator
///
/// Runs a prompt against each configured target with API key fallback.
#[derive(Parser, Debug)]
#[command(name = "llm-key-rotator")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (YAML, TOML or JSON)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Target to run; repeat for several (default: all configured targets)
    #[arg(short, long = "target")]
    targets: Vec<String>,

    /// Prompt sent as a single user message
    #[arg(short, long, default_value = "Say hi")]
    prompt: String,

    /// Maximum tokens to generate
    #[arg(long, default_value_t = 50)]
    max_tokens: i32,

    /// Print key switching progress alongside the results
    #[arg(short, long)]
    verbose: bool,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write JSON logs, including every key attempt, to this file (10MB rotation, 5 files)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load(Some(&args.config))?;

    if let Some(log_level) = args.log_level.clone() {
        settings.log_level = log_level;
    }

    logging::init_tracing(&settings.log_level, args.log_file.as_deref())?;

    tracing::info!(
        config = %args.config.display(),
        targets = settings.targets.len(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting key rotator demo"
    );

    let names: Vec<String> = if args.targets.is_empty() {
        settings.target_names().map(str::to_string).collect()
    } else {
        args.targets.clone()
    };

    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            println!("\n{}\n", "-".repeat(40));
        }
        run_target(&settings, name, &args).await;
    }

    Ok(())
}

/// Run the prompt against one target and print the outcome; failures are reported, not returned
async fn run_target(settings: &Settings, name: &str, args: &Args) {
    let Some(target_config) = settings.target(name) else {
        println!("{} failed: no such target in config", name);
        return;
    };

    // Console progress with --verbose, structured attempt events with --log-file
    let mut observers = ObserverSet::new();
    if args.verbose {
        observers.push(ConsoleObserver::default());
    }
    if args.log_file.is_some() {
        observers.push(TracingObserver::for_target(name));
    }

    let engine = ExecutionEngine::new().with_mask_prefix(settings.mask_prefix);
    let engine = if observers.is_empty() {
        engine
    } else {
        engine.with_observer(observers)
    };

    let target = match RotatingTarget::from_config(name, target_config, engine) {
        Ok(target) => target,
        Err(err) => {
            println!("{} failed: {}", name, err);
            return;
        }
    };

    let request = ChatCompletionRequest::new(
        target_config.model.clone(),
        vec![ChatMessage::user(args.prompt.as_str())],
    )
    .with_max_tokens(args.max_tokens);

    match target.chat(&request).await {
        Ok(response) => match response.first_content().map(str::trim) {
            Some(content) if !content.is_empty() => println!("{}: {}", name, content),
            _ => {
                println!("{}: Got response but content is empty", name);
                println!("Response: {:?}", response);
            }
        },
        Err(err) => {
            tracing::warn!(target_name = %name, error = %err, "Target failed");
            println!("{} failed: {}", name, err);
        }
    }
}
