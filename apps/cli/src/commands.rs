//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use accountplan_core::{
    ProgressReporter, ResearchOutcome, Researcher, apply_update, apply_update_markdown,
};
use accountplan_shared::{AppConfig, ExtractionRules, RawObservation, Report, init_config, load_config};
use accountplan_sources::{SourceRegistry, StaticSource};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// AccountPlan: research a company and draft an account plan.
#[derive(Parser)]
#[command(
    name = "accountplan",
    version,
    about = "Research a company across public sources and draft a seven-section account plan.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Markdown,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Research a company and print its account plan.
    Research {
        /// Company name.
        company: String,

        /// Output format: markdown or json (full outcome incl. conflicts).
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Write the output to a file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Per-source timeout in seconds (overrides config).
        #[arg(long)]
        timeout: Option<u64>,

        /// Extra source text read from a file, registered as the `notes` source.
        #[arg(long)]
        notes: Option<PathBuf>,
    },

    /// Replace one section of an existing account plan.
    Update {
        /// Plan file (Markdown, or JSON when the extension is .json).
        #[arg(long)]
        plan: PathBuf,

        /// Section title or an unambiguous part of one (e.g. "risks").
        #[arg(long)]
        section: String,

        /// New section body.
        #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file")]
        body: Option<String>,

        /// Read the new section body from a file.
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Rewrite the plan file instead of printing the result.
        #[arg(long)]
        in_place: bool,
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
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "accountplan=info",
        1 => "accountplan=debug",
        _ => "accountplan=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
    match cli.command {
        Command::Research {
            company,
            format,
            out,
            timeout,
            notes,
        } => cmd_research(&company, format, out.as_deref(), timeout, notes.as_deref()).await,
        Command::Update {
            plan,
            section,
            body,
            body_file,
            in_place,
        } => cmd_update(&plan, &section, body, body_file.as_deref(), in_place),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// research
// ---------------------------------------------------------------------------

async fn cmd_research(
    company: &str,
    format: OutputFormat,
    out: Option<&Path>,
    timeout: Option<u64>,
    notes: Option<&Path>,
) -> Result<()> {
    let mut config: AppConfig = load_config()?;
    if let Some(secs) = timeout {
        if secs == 0 {
            return Err(eyre!("--timeout must be at least 1 second"));
        }
        config.sources.timeout_secs = secs;
    }

    let mut registry = SourceRegistry::from_config(&config.sources)?;
    if let Some(path) = notes {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read notes file {}", path.display()))?;
        registry.register(StaticSource::new("notes", text));
    }

    info!(company, sources = ?registry.source_ids(), "researching company");

    let researcher = Researcher::new(registry, ExtractionRules::from(&config))?;
    let reporter = CliProgress::new();
    let outcome = researcher.research_with_progress(company, &reporter).await?;

    report_outcome(&outcome);

    let rendered = match format {
        OutputFormat::Markdown => accountplan_markdown::render(&outcome.report),
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
    };
    emit(&rendered, out)
}

/// Summarize source health and conflicts on stderr.
fn report_outcome(outcome: &ResearchOutcome) {
    if outcome.no_external_data {
        warn!("no source returned data; every section is a placeholder");
    }

    eprintln!();
    for source in &outcome.sources {
        eprintln!(
            "  {:<12} {:<10} {} fact(s)",
            source.source_id,
            source.fetch_status.as_str(),
            source.facts
        );
    }

    for conflict in outcome.conflicts.iter().filter(|c| c.is_conflicting) {
        eprintln!("  conflict: {}: {}", conflict.attribute.label(), conflict.describe());
    }
    eprintln!("  time: {:.1}s", outcome.elapsed.as_secs_f64());
    eprintln!();
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

fn cmd_update(
    plan: &Path,
    section: &str,
    body: Option<String>,
    body_file: Option<&Path>,
    in_place: bool,
) -> Result<()> {
    let new_body = match (body, body_file) {
        (Some(body), _) => body,
        (None, Some(path)) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read body file {}", path.display()))?,
        (None, None) => return Err(eyre!("either --body or --body-file is required")),
    };

    let text = std::fs::read_to_string(plan)
        .wrap_err_with(|| format!("failed to read plan {}", plan.display()))?;

    let updated = if is_json_plan(plan) {
        let report: Report = serde_json::from_str(&text)
            .wrap_err_with(|| format!("{} is not a valid account plan", plan.display()))?;
        let report = apply_update(&report, section, &new_body)?;
        serde_json::to_string_pretty(&report)?
    } else {
        apply_update_markdown(&text, section, &new_body)?
    };

    info!(plan = %plan.display(), section, in_place, "plan updated");

    if in_place {
        emit(&updated, Some(plan))
    } else {
        emit(&updated, None)
    }
}

fn is_json_plan(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            eprintln!("  Written to {}", path.display());
        }
        None => print!("{text}"),
    }
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
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn source_fetched(&self, observation: &RawObservation, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Extracting [{current}/{total}] {} ({})",
            observation.source_id, observation.fetch_status
        ));
    }

    fn done(&self, _outcome: &ResearchOutcome) {
        self.spinner.finish_and_clear();
    }
}
