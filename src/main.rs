mod page;
mod parser;
mod sql;

use std::path::PathBuf;

use anyhow::{Context, Result};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Page JSON to a SQL insert for the `page` table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding an array of pages
    json_file: PathBuf,

    /// Print the CREATE TABLE for `page` before the insert
    #[arg(long)]
    with_schema: bool,

    /// Parse the generated SQL back before printing it
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = sql::Options {
        with_schema: args.with_schema,
        check: args.check,
    };
    let sql = sql::convert(&args.json_file, options)
        .with_context(|| format!("converting {}", args.json_file.display()))?;
    println!("{}", sql);
    Ok(())
}
