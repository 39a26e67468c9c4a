use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use sweet_shop::app::App;
use sweet_shop::catalog::{format_currency, stock_status};
use sweet_shop::config::Config;
use sweet_shop::guard::Route;
use sweet_shop::models::SweetDraft;
use sweet_shop::session::SessionChange;

#[derive(Parser)]
#[command(name = "sweetshop-admin")]
#[command(about = "Sweet shop admin panel (ADMIN role required)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    url: Option<String>,

    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inventory with stock levels
    List,
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        price: f64,
        #[arg(short, long)]
        quantity: u32,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "")]
        image: String,
    },
    Update {
        #[arg(long)]
        id: u64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        price: Option<f64>,
        #[arg(short, long)]
        quantity: Option<u32>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        image: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: u64,
    },
    Restock {
        #[arg(long)]
        id: u64,
        #[arg(short, long)]
        quantity: u32,
    },
    /// Every purchase recorded on this client
    Purchases,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.url.as_deref(), cli.data_dir.clone(), cli.offline);
    let _log_guard = sweet_shop::logging::init(&config, "sweetshop-admin.log")?;
    let app = App::open(config)?;

    let landed = app.navigate(Route::Admin);
    if landed != Route::Admin {
        match landed {
            Route::Auth => println!("Please log in first: sweetshop login -u <user> -p <password>"),
            _ => println!("Admin role required (redirected to {}).", landed.path()),
        }
        return Ok(());
    }

    let mut watcher = app.session.watch();
    match cli.command {
        Commands::List => {
            let sweets = app.catalog.list().await?;
            let low: Vec<_> = sweets.iter().filter(|s| s.quantity < 5).collect();
            for s in &sweets {
                println!(
                    "#{:<4} {:<28} {:<11} {:>7}  qty {:<4} {}",
                    s.id,
                    s.name,
                    s.category,
                    format_currency(s.price),
                    s.quantity,
                    stock_status(s.quantity).label()
                );
            }
            let value: f64 = sweets.iter().map(|s| s.price * s.quantity as f64).sum();
            println!("{} sweets, inventory value {}, {} low on stock", sweets.len(), format_currency(value), low.len());
        }
        Commands::Add { name, category, price, quantity, description, image } => {
            let draft = SweetDraft { name, category, price, quantity, description, image };
            match app.catalog.add(draft).await {
                Ok(sweet) => println!("Sweet added successfully! (#{})", sweet.id),
                Err(e) => println!("Failed to save sweet: {}", e),
            }
        }
        Commands::Update { id, name, category, price, quantity, description, image } => {
            let current = match app.catalog.get(id).await {
                Ok(s) => s,
                Err(e) => {
                    println!("{}", e);
                    return Ok(());
                }
            };
            // Unset flags keep the current values
            let draft = SweetDraft {
                name: name.unwrap_or(current.name),
                category: category.unwrap_or(current.category),
                price: price.unwrap_or(current.price),
                quantity: quantity.unwrap_or(current.quantity),
                description: description.unwrap_or(current.description),
                image: image.unwrap_or(current.image),
            };
            match app.catalog.update(id, draft).await {
                Ok(_) => println!("Sweet updated successfully!"),
                Err(e) => println!("Failed to save sweet: {}", e),
            }
        }
        Commands::Delete { id } => match app.catalog.delete(id).await {
            Ok(()) => println!("Sweet deleted successfully!"),
            Err(e) => println!("Failed to delete sweet: {}", e),
        },
        Commands::Restock { id, quantity } => match app.catalog.restock(id, quantity).await {
            Ok(sweet) => println!("Sweet restocked successfully! {} now has {}", sweet.name, sweet.quantity),
            Err(e) => println!("Failed to restock sweet: {}", e),
        },
        Commands::Purchases => {
            let records = app.catalog.purchases()?;
            for r in &records {
                println!(
                    "{}  user {:<4} {:<28} x{:<3} {:>8}",
                    r.purchase_date.to_rfc3339(),
                    r.user_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                    r.sweet_name,
                    r.quantity,
                    format_currency(r.total_price)
                );
            }
            println!("{} purchase(s)", records.len());
        }
    }

    if watcher.latest(Duration::from_millis(20)) == Some(SessionChange::SignedOut) {
        println!("Your session expired. Please log in again.");
    }
    Ok(())
}
