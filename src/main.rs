use std::{error::Error, io, path::PathBuf, process};

use clap::Parser;
use portfolio::Portfolio;

mod csv_accounts;
mod csv_holdings;
mod hashmap_portfolio;
mod portfolio;

/// Aggregates a brokerage cost basis export into per-account holdings.
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    /// Cost basis CSV export to read
    #[clap(default_value = "mycsv.csv")]
    csv_file: PathBuf,

    /// Only log warnings and errors
    #[clap(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(err) = run(&args) {
        log::error!("unable to process the provided csv: {}", err);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    log::info!(
        "Processing cost basis csv file at path: {}",
        args.csv_file.display()
    );

    let portfolio = csv_holdings::process(&args.csv_file)?;

    let accounts_writer = csv_accounts::Writer::from_writer(io::stdout());
    accounts_writer.write_all(portfolio.get_accounts())?;

    Ok(())
}
