//! dropsource - ingest a Dropbox folder into a linked record graph.
//!
//! Usage:
//!   dropsource [PATH]              Ingest a folder (same as `ingest`)
//!   dropsource ingest [PATH]       Ingest and materialize payloads
//!   dropsource list [PATH]         List the record graph without downloading
//!   dropsource clean               Delete the payload cache and store
//!   dropsource --help              Show help

mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use dropsource_core::{FolderMatch, Record, RecordKind, RecordSet, SourceConfig};
use dropsource_ingest::{DropboxClient, Ingestor, JsonFileCache, LocalStore};
use dropsource_scan::RecordScanner;

use crate::settings::{Settings, TOKEN_ENV, validate_source};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "DROPSOURCE_LOG";

#[derive(Parser)]
#[command(
    name = "dropsource",
    version,
    about = "Ingest a Dropbox folder into a linked record graph",
    long_about = "dropsource lists a Dropbox folder, turns markdown, image and other \
                  allowed files into typed records linked to their folders, and \
                  downloads each file's content once into a local store.\n\n\
                  Running `dropsource [PATH]` is the same as `dropsource ingest [PATH]`."
)]
struct Cli {
    /// Settings file (defaults to <config dir>/dropsource/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dropbox access token
    #[arg(long, env = TOKEN_ENV, global = true, hide_env_values = true)]
    token: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List, link and materialize payloads
    Ingest {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file for the records (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep payloads that were not used by this run
        #[arg(long)]
        no_sweep: bool,
    },

    /// List the record graph without downloading anything
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete the payload cache file and the payload store
    Clean,
}

/// Source options shared by the ingesting subcommands.
#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// Remote folder to ingest (defaults to the configured path)
    path: Option<String>,

    /// Only list the folder itself, not its subfolders
    #[arg(long)]
    no_recursive: bool,

    /// Allowed extensions, comma separated (e.g. ".md,.png")
    #[arg(short, long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Do not produce folder records
    #[arg(long)]
    no_folders: bool,

    /// How files are matched to their folder
    #[arg(long, value_enum)]
    folder_match: Option<MatchRule>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MatchRule {
    /// Parent path equals the folder path
    Path,
    /// Parent directory name equals the folder name
    Name,
}

impl From<MatchRule> for FolderMatch {
    fn from(rule: MatchRule) -> Self {
        match rule {
            MatchRule::Path => FolderMatch::ParentPath,
            MatchRule::Name => FolderMatch::ParentName,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(token) = cli.token {
        settings.token = Some(token);
    }

    match cli.command {
        Some(Command::Ingest {
            source,
            output,
            no_sweep,
        }) => {
            let config = source_config(&settings, &source)?;
            run_ingest(&settings, config, output, !no_sweep).await?;
        }
        Some(Command::List { source, format }) => {
            let config = source_config(&settings, &source)?;
            run_list(&settings, config, format).await?;
        }
        Some(Command::Clean) => {
            run_clean(&settings)?;
        }
        None => {
            let config = source_config(&settings, &cli.source)?;
            run_ingest(&settings, config, None, true).await?;
        }
    }

    Ok(())
}

/// Install the log subscriber. `DROPSOURCE_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply command-line overrides to the configured source.
fn source_config(settings: &Settings, args: &SourceArgs) -> Result<SourceConfig> {
    let mut config = settings.source.clone();
    if let Some(path) = &args.path {
        config.path = path.clone();
    }
    if args.no_recursive {
        config.recursive = false;
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }
    if args.no_folders {
        config.create_folder_nodes = false;
    }
    if let Some(rule) = args.folder_match {
        config.folder_match = rule.into();
    }

    validate_source(&config)?;
    Ok(config)
}

fn dropbox_client(settings: &Settings) -> Result<DropboxClient> {
    let client = DropboxClient::new(settings.token()?);
    Ok(match &settings.api_base {
        Some(base) => client.with_api_base(base.as_str()),
        None => client,
    })
}

/// Run a full ingestion and write the records.
async fn run_ingest(
    settings: &Settings,
    config: SourceConfig,
    output: Option<PathBuf>,
    sweep: bool,
) -> Result<()> {
    let storage = Arc::new(dropbox_client(settings)?);
    let cache_file = settings.cache_file();
    let cache = Arc::new(
        JsonFileCache::open(&cache_file).wrap_err("Failed to open payload cache")?,
    );
    let store = Arc::new(LocalStore::new(settings.store_dir()));

    eprintln!("Ingesting {}...", display_path(&config));

    let ingestor = Ingestor::new(config, storage, cache.clone(), store.clone());
    let set = ingestor.run().await;
    let sweep = should_sweep(&set, sweep);
    print_summary(&set);

    let mut records: Vec<Record> = Vec::with_capacity(set.len());
    set.emit(&mut records);
    let json = serde_json::to_string_pretty(&records)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Wrote records to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    if sweep {
        let report = store.sweep().wrap_err("Failed to sweep payload store")?;
        if report.removed > 0 {
            eprintln!("Removed {} unused payload(s)", report.removed);
        }
        cache.prune_unused();
    }

    cache
        .flush()
        .wrap_err_with(|| format!("Failed to save payload cache to {}", cache_file.display()))?;

    Ok(())
}

/// Whether unused payloads and cache entries may be dropped after a run.
///
/// An empty run is indistinguishable from a failed listing, so it never
/// sweeps.
fn should_sweep(set: &RecordSet, requested: bool) -> bool {
    requested && set.files().next().is_some()
}

/// List the record graph without materializing payloads.
async fn run_list(settings: &Settings, config: SourceConfig, format: OutputFormat) -> Result<()> {
    let client = dropbox_client(settings)?;

    eprintln!("Listing {}...", display_path(&config));

    let set = RecordScanner::new(config).scan(&client).await;

    match format {
        OutputFormat::Text => {
            print_summary(&set);
            println!();
            for record in &set.records {
                print_record(record);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&set)?);
        }
    }

    Ok(())
}

/// Delete the payload cache file and store.
fn run_clean(settings: &Settings) -> Result<()> {
    let cache_file = settings.cache_file();
    match std::fs::remove_file(&cache_file) {
        Ok(()) => eprintln!("Removed {}", cache_file.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).wrap_err_with(|| format!("Failed to remove {}", cache_file.display()));
        }
    }

    let store_dir = settings.store_dir();
    if store_dir.exists() {
        let size = dir_size(&store_dir);
        std::fs::remove_dir_all(&store_dir)
            .wrap_err_with(|| format!("Failed to remove {}", store_dir.display()))?;
        eprintln!("Removed {} ({})", store_dir.display(), format_size(size));
    }

    Ok(())
}

/// Print run statistics to stderr.
fn print_summary(set: &RecordSet) {
    let stats = &set.stats;
    eprintln!();
    eprintln!("{}", "─".repeat(60));
    eprintln!(" {}", display_path(&set.config));
    eprintln!(
        " {} markdown, {} images, {} other, {} folders",
        stats.markdown_files, stats.image_files, stats.default_files, stats.folders
    );
    if stats.cache_hits + stats.downloads + stats.failures > 0 {
        eprintln!(
            " {} cached, {} downloaded, {} failed ({})",
            stats.cache_hits,
            stats.downloads,
            stats.failures,
            format_size(stats.payload_bytes)
        );
    }
    eprintln!(" Finished in {:.2}s", set.duration.as_secs_f64());
    eprintln!("{}", "─".repeat(60));
}

/// Print one record as a listing line.
fn print_record(record: &Record) {
    let marker = match record.kind {
        RecordKind::Folder => "▼",
        RecordKind::Markdown => "M",
        RecordKind::Image => "I",
        RecordKind::Default => "·",
    };
    let path = if record.is_root() { "/" } else { record.path.as_str() };

    match record.relations() {
        Some(relations) => println!(
            "{} {:<50} {} markdown, {} images",
            marker,
            truncate(path, 50),
            relations.markdown_child_ids.len(),
            relations.image_child_ids.len()
        ),
        None => println!("{} {:<50} {}", marker, truncate(path, 50), record.id),
    }
}

fn display_path(config: &SourceConfig) -> String {
    match config.remote_path() {
        path if path.is_empty() => "/".to_string(),
        path => path,
    }
}

/// Total size of the files below a directory.
fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| match e.metadata() {
            Ok(meta) if meta.is_dir() => dir_size(&e.path()),
            Ok(meta) => meta.len(),
            Err(_) => 0,
        })
        .sum()
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{}…", kept)
    }
}
