use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use repdscraper::{config::Config, process, process::utils::clean_label};

/// Print the column labels of an extract and the canonical field each maps to.
#[derive(Debug, Parser)]
#[command(name = "check_columns")]
struct Args {
    /// Extract file to inspect.
    path: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load()?;
    let aliases = cfg.field_aliases();
    let table = process::load_extract(&args.path, cfg.encoding)?;

    println!("Column names in {}:", table.source_name);
    for header in &table.headers {
        let target = aliases
            .resolve(header)
            .map(|f| f.as_str())
            .unwrap_or("(unmapped)");
        println!(" - '{}' -> {}", clean_label(header), target);
    }

    let missing = aliases.column_map(&table.headers).missing();
    if missing.is_empty() {
        println!("All canonical fields present.");
    } else {
        println!("Canonical fields with no source column:");
        for field in missing {
            println!(" - {}", field.as_str());
        }
    }
    println!("{} data rows", table.rows.len());
    Ok(())
}
