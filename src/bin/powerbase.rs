//! powerbase — flip the query on your clipboard between PowerBI and Metabase
//!
//! # Usage
//!
//! ```bash
//! # Convert the clipboard in place (settings from the environment / .env)
//! powerbase
//!
//! # Use a specific settings file
//! powerbase --env-file ~/.config/powerbase.env
//!
//! # Print the result instead of touching the clipboard
//! powerbase --dry-run
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use powerbase::prelude::*;

#[derive(Parser)]
#[command(name = "powerbase")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert the SQL query on the clipboard between PowerBI M and Metabase", long_about = None)]
#[command(after_help = "SETTINGS (environment or .env):
    DB_HOST, DB_NAME, REPLACE_POWERBI_PARAMS, REPLACE_METABASE_PARAMS,
    POWERBI_PARAMS_USE_CONCATENATION, REMOVE_METABASE_OPTIONAL_CLAUSES,
    STRIP_METABASE_OPTIONAL_CLAUSES, INLINE_POWERBI_QUERY, USE_SPACES,
    TAB_SIZE, VERBOSITY")]
struct Cli {
    /// Load settings from this file instead of ./.env
    #[arg(long, env = "POWERBASE_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Print the converted query instead of writing it to the clipboard
    #[arg(short, long)]
    dry_run: bool,
}

fn main() {
    let cli = Cli::parse();
    let mut log = Logger::console();

    if let Err(e) = run(&cli, &mut log) {
        log.reset();
        log.fatal(format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, log: &mut Logger) -> Result<()> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        }
        None => {
            // A missing ./.env is fine; the variables may already be exported.
            dotenvy::dotenv().ok();
        }
    }

    let config = Config::from_env(log)?;
    log.set_verbosity(config.verbosity);

    let mut clipboard = SystemClipboard::new().context("Failed to open the system clipboard")?;

    if cli.dry_run {
        let input = clipboard.read()?;
        let output = powerbase::convert(&input, &config, log)?;
        println!("{}", output);
        return Ok(());
    }

    powerbase::transpile_clipboard(&mut clipboard, &config, log)?;

    log.reset();
    log.success("Transpiled query copied to clipboard!");
    Ok(())
}
