//! Seed script for the local catalog
//!
//! Writes the demo sweets into the data directory so the storefront has an
//! inventory while the REST API is offline. Existing catalogs are left alone
//! unless `--reset` is given.
//! Run: cargo run --bin seed_catalog [-- --reset]

use clap::Parser;
use std::path::PathBuf;

use sweet_shop::catalog::{demo_sweets, format_currency};
use sweet_shop::config::Config;
use sweet_shop::storage::Storage;

#[derive(Parser)]
#[command(name = "seed_catalog", about = "Seed the local sweet catalog")]
struct Args {
    /// Replace whatever the local catalog holds
    #[arg(long)]
    reset: bool,

    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::from_env().with_overrides(None, args.data_dir, true);
    let reset = args.reset;

    let storage = Storage::open(config.data_dir.join("db"))?;
    let sweets = demo_sweets();

    let written = if reset {
        storage.replace_catalog(&sweets)?;
        sweets.len()
    } else {
        storage.seed_catalog(&sweets)?
    };
    storage.flush()?;

    if written == 0 {
        println!("Catalog already populated; pass --reset to overwrite.");
    }
    for sweet in storage.all_sweets()? {
        println!("#{:<4} {:<28} {:>7} x{}", sweet.id, sweet.name, format_currency(sweet.price), sweet.quantity);
    }
    println!("{} sweets seeded into {}", written, config.data_dir.display());
    Ok(())
}
