use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jit::stream::records;
use jit::{Outcome, Runtime, RuntimeConfig};

/// Load a command stream from disk, assemble it and run it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the binary command stream
    file: PathBuf,

    /// Log every command, not just reads and return values
    #[arg(short, long)]
    verbose: bool,

    /// Print the record headers of the stream instead of executing it
    #[arg(short, long)]
    listing: bool,

    /// Largest region an ALLOCATE command may request, in bytes
    #[arg(long, default_value_t = RuntimeConfig::DEFAULT_MAX_REGION_BYTES)]
    max_region_bytes: usize,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let stream = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    if stream.is_empty() {
        anyhow::bail!("{} is empty", args.file.display());
    }

    if args.listing {
        print_listing(&stream)?;
        return Ok(true);
    }

    let mut runtime = Runtime::with_config(RuntimeConfig {
        max_region_bytes: args.max_region_bytes,
        // reads are printed below
        log_reads: false,
    });
    let outcome = runtime.execute(&stream);
    print_outcome(&outcome);
    runtime.free();

    Ok(outcome.is_success())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn print_listing(stream: &[u8]) -> Result<()> {
    let recs = records(stream).context("stream cannot be decoded")?;
    for rec in &recs {
        println!("{}", rec);
    }
    println!("{} records, {} bytes", recs.len(), stream.len());
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    for read in &outcome.reads {
        println!(
            "{} offs={} size={} data={}",
            "READ_DATA".cyan(),
            read.offset,
            read.bytes.len(),
            hex::encode_upper(&read.bytes)
        );
    }
    for ret in &outcome.returns {
        println!("{} {}", "Return value:".cyan(), ret);
    }

    if outcome.is_success() {
        println!("{} {}", "✅".bold(), outcome.status.to_string().green());
    } else {
        println!("{} {}", "❌".bold(), outcome.status.to_string().red());
        if let Some(err) = &outcome.error {
            println!("   {}", err);
        }
    }
}
