use clap::{Parser, Subcommand};
use selfpay_core::{resolve_data_dir, CheckoutSession, CoreConfig, SearchEngine, ServiceItem};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "selfpay")]
#[command(about = "Self-pay checkout catalog and cart CLI")]
struct Cli {
    /// Data directory containing services.json (optional)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the full service catalog
    List,
    /// Search the catalog
    Search {
        /// Free-text query
        query: String,
    },
    /// Quote a set of services with auto-applied fees and totals
    Quote {
        /// Service ids (comma-separated)
        ids: String,
        /// Write the cart snapshot to this file after quoting
        #[arg(long)]
        save_cart: Option<PathBuf>,
    },
    /// Quote a previously saved cart snapshot
    Restore {
        /// Path to a cart snapshot written by quote --save-cart
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir(cli.data_dir.clone())?;
    let config = CoreConfig::new(data_dir)?;
    let catalog = config.load_catalog()?;
    let keywords = config.load_keyword_map()?;
    let waivers = config.load_waiver_rules()?;

    match cli.command {
        Some(Commands::List) => {
            for item in catalog.items() {
                print_service(item);
            }
        }
        Some(Commands::Search { query }) => {
            let engine = SearchEngine::new(keywords);
            let results = engine.search(&query, &catalog);
            if results.is_empty() {
                println!("No matching services.");
            } else {
                for item in results {
                    print_service(item);
                }
            }
        }
        Some(Commands::Quote { ids, save_cart }) => {
            let mut session = CheckoutSession::with_waivers(&catalog, waivers);
            for id_str in ids.split(',') {
                let id: u32 = id_str.trim().parse()?;
                match catalog.get(id) {
                    Some(service) => {
                        session.add_service(service)?;
                    }
                    None => {
                        eprintln!("Unknown service id {}, skipping", id);
                    }
                }
            }
            print_quote(&session);

            if let Some(path) = save_cart {
                let json = session.cart().to_json()?;
                std::fs::write(&path, json)?;
                println!("Saved cart snapshot to {}", path.display());
            }
        }
        Some(Commands::Restore { path }) => {
            let json = std::fs::read_to_string(&path)?;
            let mut session = CheckoutSession::with_waivers(&catalog, waivers);
            session.restore(&json)?;
            print_quote(&session);
        }
        None => {
            println!("Use 'selfpay --help' for commands");
        }
    }

    Ok(())
}

fn print_service(item: &ServiceItem) {
    let category = item.category.as_deref().unwrap_or("-");
    println!(
        "ID: {}, Name: {}, Price: {}, Code: {}, Category: {}",
        item.id, item.name, item.price, item.billing_code, category
    );
}

fn print_quote(session: &CheckoutSession) {
    if session.cart().is_empty() {
        println!("Cart is empty.");
        return;
    }
    println!("Services:");
    for item in session.cart().items() {
        println!("  {} ({}) - {}", item.name, item.billing_code, item.price);
    }
    if !session.applied_fees().is_empty() {
        println!("Fees:");
        for fee in session.applied_fees() {
            println!("  {} ({}) - {}", fee.name, fee.billing_code, fee.price);
        }
    }
    println!("Subtotal: {}", session.subtotal());
    println!("Fees: {}", session.fees_total());
    println!("Total: {}", session.total());
}
