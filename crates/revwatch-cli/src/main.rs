mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "revwatch",
    about = "Watch a remote git repository and run an update pipeline when its head moves",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .revwatch/ or .git/)
    #[arg(long, global = true, env = "REVWATCH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .revwatch/config.yaml and ignore local state in git
    Init {
        /// Repository to watch (page URL or clone URL)
        #[arg(long)]
        repo_url: Option<String>,
    },

    /// Watch the remote until interrupted
    Run {
        /// Seconds to wait before the first tick
        #[arg(long, default_value_t = cmd::run::DEFAULT_STARTUP_DELAY_SECS)]
        startup_delay: u64,
    },

    /// Run one check-and-update cycle now, ignoring the interval
    Check,

    /// Show configuration summary and the recorded revision
    Status,

    /// Print the remote head revision
    Probe {
        /// Query this URL instead of the configured repo_url
        #[arg(long)]
        url: Option<String>,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Check => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { repo_url } => cmd::init::run(&root, repo_url.as_deref()),
        Commands::Run { startup_delay } => cmd::run::run(&root, startup_delay),
        Commands::Check => cmd::check::run(&root, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Probe { url } => cmd::probe::run(&root, url.as_deref(), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
