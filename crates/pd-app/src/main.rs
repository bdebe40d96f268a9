//! Command-line driver for the paralympics dashboard
//!
//! Reads control events from stdin, one per line, and prints the rebuilt
//! artifacts as JSON on stdout. Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pd_session::{Session, SessionConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Command, Flow};

#[derive(Parser)]
#[command(name = "paradash")]
#[command(about = "Reactive paralympics dashboard driven from stdin")]
#[command(version)]
struct Cli {
    /// JSON session configuration (data paths, initial controls)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read `paralympics.csv` and `paralympics.db` from this directory
    #[arg(short, long, conflicts_with = "config")]
    data_dir: Option<PathBuf>,

    /// Write the bundled sample dataset into this directory and exit
    #[arg(long, value_name = "DIR")]
    init_sample: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(dir) = cli.init_sample {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let config = pd_data::sample::write_sample(&dir)
            .with_context(|| format!("Failed to write sample data to {}", dir.display()))?;
        info!(
            "Sample data written to {} and {}",
            config.csv_path.display(),
            config.db_path.display()
        );
        return Ok(());
    }

    let config = match (cli.config, cli.data_dir) {
        (Some(path), _) => SessionConfig::from_json_file(&path)?,
        (None, Some(dir)) => SessionConfig::new(pd_data::SourceConfig::in_dir(dir)),
        (None, None) => SessionConfig::default(),
    };

    let session = Session::open(&config).context("Failed to open session")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::print_all(&session, &mut out)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                commands::print_error(&mut out, &e.to_string())?;
                continue;
            }
        };
        if commands::execute(&session, command, &mut out)? == Flow::Quit {
            break;
        }
        out.flush()?;
    }

    Ok(())
}
