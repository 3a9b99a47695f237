//! `anybox` command line tool.
//!
//! ```bash
//! # list known identifiers
//! anybox types
//!
//! # verify that a document survives a decode / encode / decode cycle
//! anybox check gallery.json
//!
//! # re-render stdin as RON
//! cat gallery.json | anybox convert - --to ron
//! ```

use anybox::{Format, Registry};
use anybox_cli::{check, convert, read_input, types, Document};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "anybox")]
#[command(about = "Inspect and convert self-describing envelope documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered identifiers with their kind
    Types,
    /// Decode, re-encode and decode again, verifying content stability
    Check {
        /// Input file, `-` for stdin
        input: PathBuf,

        /// Input format: json or ron
        #[arg(long, default_value = "json")]
        from: Format,
    },
    /// Decode and render in another format
    Convert {
        /// Input file, `-` for stdin
        input: PathBuf,

        /// Output format: json, pretty or ron
        #[arg(long)]
        to: Format,

        /// Input format: json or ron
        #[arg(long, default_value = "json")]
        from: Format,
    },
}

fn main() -> Result<()> {
    let stdout_printer = tracing_subscriber::fmt::Layer::new().with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(stdout_printer)
        .init();

    let args = Args::parse();
    let registry = anybox_cli::registry();

    match args.command {
        Commands::Types => print!("{}", types(&registry)),
        Commands::Check { input, from } => {
            let document = load(&registry, &input, from)?;
            print!("{}", check(&registry, &document)?);
        }
        Commands::Convert { input, to, from } => {
            let document = load(&registry, &input, from)?;
            println!("{}", convert(&registry, &document, to)?);
        }
    }
    Ok(())
}

fn load(registry: &Registry, input: &Path, from: Format) -> Result<Document> {
    let text = read_input(input)?;
    Document::parse(registry, &text, from)
        .with_context(|| format!("failed to decode {}", input.display()))
}
