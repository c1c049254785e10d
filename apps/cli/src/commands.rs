//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use schedkit_core::bundle::bundle_files;
use schedkit_core::courses::build_courses;
use schedkit_core::instructors::build_instructors;
use schedkit_core::normalize::normalize_sections;
use schedkit_core::output::{read_json, write_json};
use schedkit_core::pipeline::{OutputPaths, read_outputs, run_file, write_outputs};
use schedkit_core::subjects::build_subjects;
use schedkit_core::validate::validate_output;
use schedkit_core::{PipelineOutput, ProgressReporter, ReferenceTables};
use schedkit_crawler::{CrawlProgress, Crawler};
use schedkit_shared::{
    AppConfig, Course, CrawlConfig, RawSection, Section, init_config, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// schedkit — normalize and cross-reference course schedule snapshots.
#[derive(Parser)]
#[command(
    name = "schedkit",
    version,
    about = "Crawl, normalize, and bundle course schedule snapshots.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.schedkit/schedkit.toml.
    #[arg(long, global = true, env = "SCHEDKIT_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Normalize a raw section snapshot.
    Sections {
        /// Raw sections JSON.
        input: PathBuf,
        /// Normalized sections JSON to write.
        output: PathBuf,
    },

    /// Aggregate normalized sections into courses.
    Courses {
        /// Normalized sections JSON.
        input: PathBuf,
        /// Courses JSON to write.
        output: PathBuf,
    },

    /// Aggregate normalized sections into instructors.
    Instructors {
        /// Normalized sections JSON.
        input: PathBuf,
        /// Instructors JSON to write.
        output: PathBuf,
    },

    /// Aggregate courses into subjects.
    Subjects {
        /// Courses JSON.
        input: PathBuf,
        /// Subjects JSON to write.
        output: PathBuf,
    },

    /// Stitch the four snapshots into one bundle.
    Bundle {
        sections: PathBuf,
        courses: PathBuf,
        subjects: PathBuf,
        instructors: PathBuf,
        /// Bundle JSON to write.
        output: PathBuf,
    },

    /// Run every stage over a raw snapshot.
    Run {
        /// Raw sections JSON.
        input: PathBuf,

        /// Directory for the four stage snapshots.
        #[arg(long)]
        out_dir: PathBuf,

        /// Also write a bundle to this path.
        #[arg(long)]
        bundle: Option<PathBuf>,
    },

    /// Check cross-references between the four snapshots in a directory.
    Check {
        #[arg(long)]
        dir: PathBuf,
    },

    /// Crawl schedules into raw snapshots.
    ///
    /// With --term or --url, one term is written to --out. Otherwise every
    /// term in the config is crawled and --out is a directory receiving
    /// `<term>.json` per term.
    Crawl {
        /// Term name appended to the configured base URL.
        #[arg(long)]
        term: Option<String>,

        /// Explicit start URL (overrides --term).
        #[arg(long)]
        url: Option<String>,

        /// Raw sections JSON file, or output directory when crawling all terms.
        #[arg(long)]
        out: PathBuf,
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
        0 => "schedkit=info",
        1 => "schedkit=debug",
        _ => "schedkit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
        Command::Sections { input, output } => cmd_sections(config_path, &input, &output),
        Command::Courses { input, output } => cmd_courses(&input, &output),
        Command::Instructors { input, output } => cmd_instructors(&input, &output),
        Command::Subjects { input, output } => cmd_subjects(config_path, &input, &output),
        Command::Bundle {
            sections,
            courses,
            subjects,
            instructors,
            output,
        } => cmd_bundle(
            OutputPaths {
                sections,
                courses,
                instructors,
                subjects,
            },
            &output,
        ),
        Command::Run {
            input,
            out_dir,
            bundle,
        } => cmd_run(config_path, &input, &out_dir, bundle.as_deref()),
        Command::Check { dir } => cmd_check(&dir),
        Command::Crawl { term, url, out } => {
            cmd_crawl(config_path, term.as_deref(), url.as_deref(), &out).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn resolve_tables(path: Option<&Path>) -> Result<ReferenceTables> {
    let config = resolve_config(path)?;
    Ok(ReferenceTables::load(&config.tables)?)
}

// ---------------------------------------------------------------------------
// Stage commands
// ---------------------------------------------------------------------------

fn cmd_sections(config: Option<&Path>, input: &Path, output: &Path) -> Result<()> {
    let tables = resolve_tables(config)?;
    let raw: Vec<RawSection> = read_json(input)?;
    let sections = normalize_sections(&raw, &tables.tags)?;
    write_json(output, &sections)?;

    info!(count = sections.len(), path = %output.display(), "sections written");
    Ok(())
}

fn cmd_courses(input: &Path, output: &Path) -> Result<()> {
    let sections: Vec<Section> = read_json(input)?;
    let courses = build_courses(&sections);
    write_json(output, &courses)?;

    info!(count = courses.len(), path = %output.display(), "courses written");
    Ok(())
}

fn cmd_instructors(input: &Path, output: &Path) -> Result<()> {
    let sections: Vec<Section> = read_json(input)?;
    let instructors = build_instructors(&sections);
    write_json(output, &instructors)?;

    info!(count = instructors.len(), path = %output.display(), "instructors written");
    Ok(())
}

fn cmd_subjects(config: Option<&Path>, input: &Path, output: &Path) -> Result<()> {
    let tables = resolve_tables(config)?;
    let courses: Vec<Course> = read_json(input)?;
    let subjects = build_subjects(&courses, &tables.subjects);
    write_json(output, &subjects)?;

    info!(count = subjects.len(), path = %output.display(), "subjects written");
    Ok(())
}

fn cmd_bundle(inputs: OutputPaths, output: &Path) -> Result<()> {
    let meta = bundle_files(&inputs, output)?;

    println!();
    println!("  Bundle written");
    println!("  Path:    {}", meta.path.display());
    println!("  Size:    {} bytes", meta.size_bytes);
    println!("  SHA-256: {}", meta.sha256);
    println!();

    Ok(())
}

fn cmd_run(config: Option<&Path>, input: &Path, out_dir: &Path, bundle: Option<&Path>) -> Result<()> {
    let tables = resolve_tables(config)?;

    info!(input = %input.display(), out_dir = %out_dir.display(), "running pipeline");

    let reporter = CliProgress::new();
    let output = run_file(input, &tables, &reporter)?;
    let paths = write_outputs(&output, out_dir)?;

    println!();
    println!("  Pipeline complete!");
    println!("  Sections:    {}", output.sections.len());
    println!("  Courses:     {}", output.courses.len());
    println!("  Instructors: {}", output.instructors.len());
    println!("  Subjects:    {}", output.subjects.len());
    println!("  Output:      {}", out_dir.display());

    if let Some(bundle_path) = bundle {
        let meta = bundle_files(&paths, bundle_path)?;
        println!("  Bundle:      {} ({} bytes)", meta.path.display(), meta.size_bytes);
    }
    println!();

    Ok(())
}

fn cmd_check(dir: &Path) -> Result<()> {
    let output = read_outputs(dir)?;
    validate_output(&output).wrap_err_with(|| format!("snapshots in {} are inconsistent", dir.display()))?;

    println!(
        "ok: {} sections, {} courses, {} instructors, {} subjects",
        output.sections.len(),
        output.courses.len(),
        output.instructors.len(),
        output.subjects.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Crawl
// ---------------------------------------------------------------------------

async fn cmd_crawl(
    config_path: Option<&Path>,
    term: Option<&str>,
    url: Option<&str>,
    out: &Path,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let crawler = Crawler::new(CrawlConfig::from(&config))?;
    let reporter = CliProgress::new();

    let start_url = match (url, term) {
        (Some(u), _) => Some(Url::parse(u).map_err(|e| eyre!("invalid URL '{u}': {e}"))?),
        (None, Some(t)) => {
            if !config.crawl.terms.iter().any(|known| known == t) {
                warn!(term = t, known = ?config.crawl.terms, "term is not in the configured list");
            }
            Some(config.crawl.term_url(t)?)
        }
        (None, None) => None,
    };

    let Some(start_url) = start_url else {
        if config.crawl.terms.is_empty() {
            return Err(eyre!("no terms configured; pass --term or --url"));
        }

        let crawls = crawler.crawl_terms(&config.crawl, &reporter).await?;
        reporter.spinner.finish_and_clear();

        println!();
        println!("  Crawl complete!");
        for crawl in &crawls {
            let path = out.join(format!("{}.json", crawl.term));
            write_json(&path, &crawl.result.sections)?;
            println!(
                "  {:<8} {:>5} sections  {:>3} pages  {}",
                crawl.term,
                crawl.result.sections.len(),
                crawl.result.pages_fetched,
                path.display()
            );
        }
        println!();

        return Ok(());
    };

    let result = crawler.crawl_term(&start_url, &reporter).await?;
    reporter.spinner.finish_and_clear();

    match &result.term_title {
        Some(title) => info!(term = %title.join(" "), "term heading read"),
        None => warn!(url = %start_url, "could not read term heading"),
    }

    write_json(out, &result.sections)?;

    println!();
    println!("  Crawl complete!");
    if let Some(title) = &result.term_title {
        println!("  Term:     {}", title.join(" "));
    }
    println!("  Pages:    {}", result.pages_fetched);
    println!("  Sections: {}", result.sections.len());
    println!("  Output:   {}", out.display());
    println!("  Time:     {:.1}s", result.duration.as_secs_f64());
    println!();

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

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _output: &PipelineOutput) {
        self.spinner.finish_and_clear();
    }
}

impl CrawlProgress for CliProgress {
    fn page_fetched(&self, url: &str, page: usize, rows_so_far: usize) {
        self.spinner
            .set_message(format!("Fetched page {page} ({rows_so_far} rows) {url}"));
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
