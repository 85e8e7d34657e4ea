use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{debug, info};

use scalper::{
    config, logger, CancelToken, HistoryStore, KaggleClient, LogReporter, ResourceKind, SearchRun,
};

#[derive(Parser)]
#[command(name = "scalper", about = "Scalper CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a resource kind and save the results to CSV
    Search {
        #[command(subcommand)]
        kind: SearchKind,
    },
    /// Scalper utils
    Utils {
        #[command(subcommand)]
        util: Util,
    },
}

#[derive(Subcommand)]
enum SearchKind {
    /// Search kernels
    Kernels {
        /// Term(s) to search for
        #[arg(short, long)]
        search: String,

        /// Directory to save the results
        #[arg(short, long, default_value = config::DEFAULT_DATA_DIR)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum Util {
    /// For test purposes
    Test {
        /// Set this flag for debug
        #[arg(short, long)]
        debug: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            kind: SearchKind::Kernels { search, out },
        } => {
            logger::init(false);
            run_search(ResourceKind::Kernels, &search, &out)?;
        }
        Command::Utils {
            util: Util::Test { debug },
        } => {
            logger::init(debug);
            debug!("Test");
        }
    }

    Ok(())
}

fn run_search(kind: ResourceKind, term: &str, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    info!("Starting scalper {} search...", kind.label());

    let cancel = CancelToken::new();
    cancel.register_sigint()?;

    let client = KaggleClient::new()?;
    let store = HistoryStore::new(out_dir);
    let reporter = LogReporter;

    // An interrupted run comes back as a normal summary: partial results
    // were saved and recorded, so the process still exits 0.
    SearchRun::new(&client, &store, &reporter, kind).execute(term, out_dir, &cancel)?;
    Ok(())
}
