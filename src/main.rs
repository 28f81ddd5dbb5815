use clap::{Args, CommandFactory, Parser, Subcommand};
use colored::Colorize;
use harxref::{
    load_har, shared_report, stats_report, values_report, where_report, Config, ExportStats,
    HarCapture, HeaderMode, IndexExport, Indexer, Indexes,
};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "harxref")]
#[command(author, version, about = "Cross-reference keys and values in HAR captures")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Args, Debug)]
struct Input {
    /// HAR capture to index
    har: PathBuf,

    /// Header handling: separate, merged or skip
    #[arg(long)]
    headers: Option<HeaderMode>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary counts for a capture
    Stats {
        #[command(flatten)]
        input: Input,
    },

    /// Where did a value come from?
    Where {
        #[command(flatten)]
        input: Input,

        /// Exact value to look up
        value: String,

        /// Maximum occurrences to list (0 = unlimited)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// What values has a key taken?
    Values {
        #[command(flatten)]
        input: Input,

        /// Key (query/form/JSON key or header name)
        key: String,

        /// Maximum occurrences to list (0 = unlimited)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Values appearing in more than one transaction
    Shared {
        #[command(flatten)]
        input: Input,

        /// Maximum values to list (0 = unlimited)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write both indices as JSON
    Export {
        #[command(flatten)]
        input: Input,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

/// Load a capture and index it with config + CLI overrides
fn build(input: &Input, config: &Config) -> harxref::Result<(HarCapture, Indexes)> {
    let capture = load_har(&input.har)?;

    let mut options = config.extract;
    if let Some(mode) = input.headers {
        options.headers = mode;
    }

    let mut indexer = Indexer::new(options);
    indexer.index_all(&capture.transactions);
    let indexes = indexer.finish();
    indexes.check_consistency()?;

    Ok((capture, indexes))
}

fn limit_or(limit: Option<usize>, config: &Config) -> Option<usize> {
    match limit {
        Some(0) => None,
        Some(n) => Some(n),
        None => config.listing_limit(),
    }
}

/// Print a report with its first line highlighted
fn print_report(report: &str) {
    let mut lines = report.lines();
    if let Some(first) = lines.next() {
        println!("{}", first.bold());
    }
    for line in lines {
        println!("{}", line);
    }
}

fn run(cli: Cli, config: Config) -> harxref::Result<()> {
    match cli.command {
        Command::Stats { input } => {
            let (capture, indexes) = build(&input, &config)?;
            let stats =
                ExportStats::new(indexes.stats(), capture.transactions.len(), capture.skipped);
            println!("{}", input.har.display().to_string().bold());
            print!("{}", stats_report(&stats, indexes.shared_values().len()));
        }

        Command::Where {
            input,
            value,
            limit,
        } => {
            let (capture, indexes) = build(&input, &config)?;
            print_report(&where_report(
                &indexes,
                &capture.transactions,
                &value,
                limit_or(limit, &config),
            ));
        }

        Command::Values { input, key, limit } => {
            let (capture, indexes) = build(&input, &config)?;
            print_report(&values_report(
                &indexes,
                &capture.transactions,
                &key,
                limit_or(limit, &config),
            ));
        }

        Command::Shared { input, limit } => {
            let (_, indexes) = build(&input, &config)?;
            print_report(&shared_report(&indexes, limit_or(limit, &config)));
        }

        Command::Export { input, output } => {
            let (capture, indexes) = build(&input, &config)?;
            let export = IndexExport::new(
                &indexes,
                Some(input.har.display().to_string()),
                capture.transactions.len(),
                capture.skipped,
            );
            let json = export.to_json()?;

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| harxref::Error::io(parent, e))?;
                    }
                    std::fs::write(&path, json).map_err(|e| harxref::Error::io(&path, e))?;
                    eprintln!("{} {}", "Exported".green(), path.display());
                }
                None => println!("{}", json),
            }
        }

        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "harxref", &mut io::stdout());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load();
    if cli.no_color || !config.report.color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli, config) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
