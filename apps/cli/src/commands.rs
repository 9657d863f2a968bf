//! CLI command definitions, routing, and tracing setup.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use autopress_cms::CmsClient;
use autopress_core::{
    BatchConfig, ItemOutcome, ProgressReporter, RunReport, load_system_instruction, run_batch,
};
use autopress_generator::OpenAiGenerator;
use autopress_shared::{
    AppConfig, CmsSettings, GeneratorSettings, PublishSettings, init_config, load_config,
    load_config_from, locate_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// autopress: generate articles with an LLM and publish them to WordPress.
#[derive(Parser)]
#[command(
    name = "autopress",
    version,
    about = "Generate articles from a CSV of topics and publish them to WordPress.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./autopress.toml, then ~/.autopress/autopress.toml).
    #[arg(long, global = true, env = "AUTOPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate and publish one post per input row.
    Run {
        /// Input CSV (overrides `pipeline.input_file`).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// System prompt file (overrides `pipeline.system_prompt_file`).
        #[arg(short, long)]
        system_prompt: Option<PathBuf>,

        /// Topics processed at once (overrides `pipeline.concurrency`).
        #[arg(short, long)]
        concurrency: Option<NonZeroUsize>,

        /// Wait for ENTER before exiting.
        #[arg(long)]
        pause: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a template config file.
    Init {
        /// Where to write it (defaults to ~/.autopress/autopress.toml).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration with secrets redacted.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "autopress=info",
        1 => "autopress=debug",
        _ => "autopress=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run {
            input,
            system_prompt,
            concurrency,
            pause,
        } => {
            let result = cmd_run(config_path, input, system_prompt, concurrency).await;
            if pause {
                wait_for_enter().await?;
            }
            result
        }
        Command::Config { action } => match action {
            ConfigAction::Init { path } => cmd_config_init(path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
    system_prompt: Option<PathBuf>,
    concurrency: Option<NonZeroUsize>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(n) = concurrency {
        config.pipeline.concurrency = n.get();
    }

    let input_path = input.unwrap_or_else(|| PathBuf::from(&config.pipeline.input_file));
    let prompt_path =
        system_prompt.unwrap_or_else(|| PathBuf::from(&config.pipeline.system_prompt_file));

    let rows = autopress_input::read_rows(&input_path)?;
    let instruction = load_system_instruction(&prompt_path)?;

    let generator = OpenAiGenerator::new(&GeneratorSettings::try_from(&config)?)?;
    let cms = CmsClient::new(&CmsSettings::from(&config))?;

    let batch = BatchConfig {
        instruction,
        concurrency: config.pipeline.concurrency,
        publish: PublishSettings::from(&config),
    };

    info!(
        input = %input_path.display(),
        rows = rows.len(),
        model = generator.model(),
        site = cms.base_url(),
        concurrency = batch.concurrency,
        "starting run"
    );

    let reporter = CliProgress::new();
    let report = match run_batch(&batch, &rows, Arc::new(generator), &cms, &reporter).await {
        Ok(report) => report,
        Err(e) => {
            reporter.abandon();
            let origin = e.origin();
            return Err(Report::new(e).wrap_err(format!("run aborted: {origin}")));
        }
    };

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Run finished.");
    println!("  Run:       {}", report.run_id);
    println!("  Topics:    {}", report.total);
    println!("  Authors:   {}", report.authors_resolved);
    println!("  Status:    {}", report.post_status);
    println!("  Published: {}", report.published_count());
    println!("  Failed:    {}", report.failed_count());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());

    if report.failed_count() > 0 {
        println!();
        println!("  Failed topics:");
        for outcome in report.failures() {
            if let ItemOutcome::Failed {
                topic,
                stage,
                error,
            } = outcome
            {
                println!("    - {topic} ({stage}): {error}");
            }
        }
    }
    println!();
}

async fn wait_for_enter() -> Result<()> {
    println!("Press ENTER to exit.");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_finished(&self, outcome: &ItemOutcome, completed: usize, total: usize) {
        let mark = if outcome.is_published() { "✓" } else { "✗" };
        self.spinner.set_message(format!(
            "[{completed}/{total}] {mark} {}",
            outcome.topic()
        ));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    println!("Fill in the [openai] and [wordpress] sections before running.");
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let path = locate_config(config_path)?;
    let config: AppConfig = load_config_from(&path)?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("# {}", path.display());
    println!("{toml_str}");
    Ok(())
}
