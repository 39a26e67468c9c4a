//! sweetshop: storefront surface
//!
//! Login/register landing, the dashboard (browse, filter, purchase) and the
//! purchase history. Session state persists in the data directory between
//! invocations; every command is routed through the route guard first.
//!
//! Usage:
//!   sweetshop login -u user1 -p user123
//!   sweetshop sweets --category Chocolate --max-price 5
//!   sweetshop buy 3 -q 2
//!   sweetshop purchases

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use sweet_shop::app::App;
use sweet_shop::catalog::{categories, format_currency, stock_status, SweetFilter};
use sweet_shop::config::Config;
use sweet_shop::guard::Route;
use sweet_shop::models::{LoginRequest, RegisterRequest, Role, Sweet};
use sweet_shop::session::{SessionChange, SessionWatcher};
use sweet_shop::token;
use sweet_shop::validation::validate_registration;

#[derive(Parser)]
#[command(name = "sweetshop")]
#[command(about = "Sweet shop storefront", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// REST API base URL (overrides SWEETSHOP_API_BASE_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Directory holding the session, local catalog and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use only the local fallback
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Defaults to the password when omitted
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long, default_value = "USER")]
        role: String,
        /// Log in right after registering
        #[arg(long)]
        login: bool,
    },
    Logout,
    Whoami,
    /// Browse the catalog (dashboard)
    Sweets {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    Show {
        id: u64,
    },
    Buy {
        id: u64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    Purchases,
    Categories,
}

/// Route guard check for a surface; prints the redirect when denied
fn enter(app: &App, route: Route) -> bool {
    let landed = app.navigate(route);
    if landed == route {
        return true;
    }
    match (route, landed) {
        (Route::Auth, _) => println!("Already logged in. Log out first."),
        (_, Route::Auth) => println!("Please log in first (redirected to {}).", landed.path()),
        _ => println!("Not allowed here (redirected to {}).", landed.path()),
    }
    false
}

fn print_sweet(sweet: &Sweet) {
    let stock = if sweet.quantity == 0 {
        "Out of Stock".to_string()
    } else {
        format!("{} in stock", sweet.quantity)
    };
    println!(
        "#{:<4} {:<28} {:<11} {:>7}  {} [{}]",
        sweet.id,
        sweet.name,
        sweet.category,
        format_currency(sweet.price),
        stock,
        stock_status(sweet.quantity).label()
    );
}

/// Resync with session changes made behind the command's back (a 401 from the API)
fn warn_if_expired(watcher: &mut SessionWatcher) {
    if watcher.latest(Duration::from_millis(20)) == Some(SessionChange::SignedOut) {
        println!("Your session expired. Please log in again.");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.url.as_deref(), cli.data_dir.clone(), cli.offline);
    let _log_guard = sweet_shop::logging::init(&config, "sweetshop.log")?;
    let app = App::open(config)?;
    let mut watcher = app.session.watch();

    match cli.command {
        Commands::Login { username, password } => {
            if !enter(&app, Route::Auth) {
                return Ok(());
            }
            match app.auth.login(LoginRequest { username, password }).await {
                Ok(resp) => println!("Logged in as {} ({}).", resp.user.username, resp.user.role),
                Err(e) => println!("Login failed: {}", e),
            }
        }
        Commands::Register { username, email, password, confirm_password, role, login } => {
            let confirm = confirm_password.unwrap_or_else(|| password.clone());
            if let Err(e) = validate_registration(&username, &email, &password, &confirm) {
                println!("Registration failed: {}", e);
                return Ok(());
            }
            let Some(role) = Role::parse(&role) else {
                println!("Registration failed: role must be USER or ADMIN");
                return Ok(());
            };
            let req = RegisterRequest {
                username: username.clone(),
                email,
                password: password.clone(),
                role: Some(role),
            };
            match app.auth.register(req).await {
                Ok(user) => println!("Registration successful: #{} {} ({})", user.id, user.username, user.role),
                Err(e) => {
                    println!("Registration failed: {}", e);
                    return Ok(());
                }
            }
            if login {
                match app.auth.login(LoginRequest { username, password }).await {
                    Ok(resp) => println!("Logged in as {}.", resp.user.username),
                    Err(e) => println!("Login failed: {}", e),
                }
            }
        }
        Commands::Logout => {
            app.auth.logout();
            println!("Logged out.");
        }
        Commands::Whoami => match app.auth.current_user() {
            Some(session) => {
                println!("{} (id {}, {})", session.username, session.user_id, session.role);
                if let Some(claims) = token::decode(&session.token) {
                    let state = if claims.is_expired(Utc::now()) { "expired" } else { "valid" };
                    println!("local token, {} until {} ms", state, claims.exp);
                }
            }
            None => println!("Not logged in."),
        },
        Commands::Sweets { search, category, min_price, max_price } => {
            if !enter(&app, Route::Dashboard) {
                return Ok(());
            }
            let filter = SweetFilter { search, category, min_price, max_price };
            let sweets = if filter.is_empty() {
                app.catalog.list().await?
            } else {
                app.catalog.search(&filter).await?
            };
            for sweet in &sweets {
                print_sweet(sweet);
            }
            println!("{} sweet{} found", sweets.len(), if sweets.len() == 1 { "" } else { "s" });
            if app.auth.is_admin() {
                println!("(admin: use sweetshop-admin to manage inventory)");
            }
            warn_if_expired(&mut watcher);
        }
        Commands::Show { id } => {
            if !enter(&app, Route::Dashboard) {
                return Ok(());
            }
            match app.catalog.get(id).await {
                Ok(sweet) => {
                    print_sweet(&sweet);
                    if !sweet.description.is_empty() {
                        println!("      {}", sweet.description);
                    }
                }
                Err(e) => println!("{}", e),
            }
            warn_if_expired(&mut watcher);
        }
        Commands::Buy { id, quantity } => {
            if !enter(&app, Route::Dashboard) {
                return Ok(());
            }
            match app.catalog.purchase(id, quantity).await {
                Ok(record) => println!(
                    "Successfully purchased {} {}{}! Total {}",
                    record.quantity,
                    record.sweet_name,
                    if record.quantity > 1 { "s" } else { "" },
                    format_currency(record.total_price)
                ),
                Err(e) => println!("{}", e),
            }
            warn_if_expired(&mut watcher);
        }
        Commands::Purchases => {
            if !enter(&app, Route::Purchases) {
                return Ok(());
            }
            let Some(session) = app.auth.current_user() else {
                return Ok(());
            };
            let records = app.catalog.purchases_for(session.user_id)?;
            let mut total = 0.0;
            for r in &records {
                total += r.total_price;
                println!(
                    "{}  {:<28} x{:<3} {:>8}",
                    r.purchase_date.format("%b %d, %Y %H:%M"),
                    r.sweet_name,
                    r.quantity,
                    format_currency(r.total_price)
                );
            }
            println!(
                "{} purchase(s), {} spent, {} item(s) today",
                records.len(),
                format_currency(total),
                app.catalog.purchased_today(Utc::now())?
            );
        }
        Commands::Categories => {
            for c in categories() {
                println!("{}", c);
            }
        }
    }

    Ok(())
}
