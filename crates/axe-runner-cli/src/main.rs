use std::{
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axe_runner_core::{
    build_report, render_report, resolve, FileConfigLoader, OutputFormat, RawResults, RunReport,
    ScanDriver, ScanEngine, ScanOptions, ScanOptionsPatch, ScanOutcome, Verdict, CONFIG_FILENAME,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "axe-runner",
    author,
    version,
    about = "Accessibility scan reporter for axe-core results"
)]
struct Cli {
    /// Path to the axe config file
    #[arg(
        long = "config",
        value_name = "FILE",
        default_value = CONFIG_FILENAME,
        global = true
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a raw axe results payload and report the verdict
    Scan {
        /// Raw axe-core results JSON file (stdin when omitted)
        results: Option<PathBuf>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Emit the report as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved effective configuration
    ShowConfig {
        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

/// Call-site configuration layer; every flag overrides the config file and
/// the built-in defaults, absent flags leave the lower layers alone.
#[derive(Args, Debug)]
struct OverrideArgs {
    /// Selector of the DOM subtree the payload was scanned on
    #[arg(long)]
    context: Option<String>,

    /// Scan timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// List every passing rule as well
    #[arg(long)]
    verbose: bool,

    /// Include each node's target selectors
    #[arg(long)]
    selectors: bool,

    /// Include each node's ancestry chain
    #[arg(long)]
    ancestry: bool,

    /// Include each node's element reference
    #[arg(long)]
    element_ref: bool,

    /// Include related-check details per node
    #[arg(long)]
    related_nodes: bool,
}

impl OverrideArgs {
    fn patch(&self) -> ScanOptionsPatch {
        ScanOptionsPatch {
            timeout_ms: self.timeout,
            verbose: self.verbose.then_some(true),
            selectors: self.selectors.then_some(true),
            ancestry: self.ancestry.then_some(true),
            element_ref: self.element_ref.then_some(true),
            related_nodes: self.related_nodes.then_some(true),
            ..Default::default()
        }
    }
}

/// Engine adapter that replays a captured raw payload, so the driver and
/// reporting pipeline run exactly as they would against a live browser.
struct ReplayEngine {
    results: RawResults,
}

#[async_trait]
impl ScanEngine for ReplayEngine {
    async fn inject(&self) -> Result<bool> {
        Ok(true)
    }

    async fn run(&self, _context: &str, _options: &ScanOptions) -> Result<RawResults> {
        Ok(self.results.clone())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            results,
            overrides,
            json,
        } => {
            let code = scan(&cli.config, results.as_deref(), &overrides, json).await?;
            std::process::exit(code);
        }
        Commands::ShowConfig { overrides } => show_config(&cli.config, &overrides)?,
    }
    Ok(())
}

async fn scan(
    config_path: &Path,
    results: Option<&Path>,
    overrides: &OverrideArgs,
    json: bool,
) -> Result<i32> {
    let loader = FileConfigLoader::with_path(config_path);
    let config = resolve(&loader, overrides.context.as_deref(), Some(&overrides.patch()))?;

    let raw = load_results(results)?;
    let driver = ScanDriver::new(Arc::new(ReplayEngine { results: raw }));
    let outcome = driver.run_scan(&config).await;
    let report = build_report(&config.options, &outcome);

    if json {
        println!("{}", render_report(&report, OutputFormat::Json)?);
    } else {
        print_human(&report);
    }

    Ok(match (&report.verdict, &outcome) {
        (Verdict::Pass, _) => 0,
        (Verdict::Fail { .. }, ScanOutcome::Completed { .. }) => 1,
        (Verdict::Fail { .. }, _) => 2,
    })
}

fn load_results(path: Option<&Path>) -> Result<RawResults> {
    let payload = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read results file at {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read results payload from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&payload).context("results payload is not valid axe-core JSON")
}

fn print_human(report: &RunReport) {
    for line in &report.diagnostics {
        if line.starts_with("-----") || line.starts_with('#') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
    for assertion in &report.assertions {
        if assertion.passed {
            println!("{} {}", "ok".green(), assertion.message);
        } else {
            println!("{} {}", "FAILED".red().bold(), assertion.message);
        }
    }
    match &report.verdict {
        Verdict::Pass => println!("{}", "Verdict: pass".green().bold()),
        Verdict::Fail { reason } => {
            println!("{}", format!("Verdict: fail ({reason})").red().bold())
        }
    }
}

fn show_config(config_path: &Path, overrides: &OverrideArgs) -> Result<()> {
    let loader = FileConfigLoader::with_path(config_path);
    let config = resolve(&loader, overrides.context.as_deref(), Some(&overrides.patch()))?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
