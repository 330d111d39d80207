mod commands;
mod config;
mod openrouter;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_inventory_add, cmd_inventory_add_random, cmd_inventory_delete, cmd_inventory_list,
    cmd_inventory_remove_random, cmd_inventory_update, cmd_recipe_list, cmd_recipe_show, cmd_scan,
    cmd_suggest,
};
use crate::config::Config;
use crate::openrouter::OpenRouterClient;
use fridge_core::db::Database;
use fridge_core::receipt::{DemoReceiptExtractor, ReceiptExtractor};

#[derive(Parser)]
#[command(
    name = "fridge",
    version,
    about = "A fridge inventory tracker with expiry-aware recipe suggestions",
    long_about = "\n\n  ┌─────────┐
  │ ▪       │  fridge
  ├─────────┤  use it before you lose it.
  │ ▪       │
  │         │
  └─────────┘
"
)]
struct Cli {
    /// Path to the database file (default: fridge.db in the data directory)
    #[arg(long, global = true, env = "FRIDGE_DB", value_name = "PATH")]
    db: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage what is in the fridge
    Inventory {
        #[command(subcommand)]
        command: InventoryCommands,
    },
    /// Browse the recipe catalog
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Suggest recipes that use up what expires soonest
    Suggest {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract grocery items from a photo of a receipt
    Scan {
        /// Receipt image (JPEG, PNG, WebP or GIF)
        image: PathBuf,
        /// Use canned demo items instead of calling the AI service
        #[arg(long)]
        demo: bool,
        /// Add the extracted items to the fridge
        #[arg(long)]
        add: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Serve canned receipt items even when an API key is configured
        #[arg(long)]
        demo_receipts: bool,
    },
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List ingredients, soonest expiry first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an ingredient
    Add {
        /// Ingredient name
        name: String,
        /// How many
        quantity: i64,
        /// Expiry date (YYYY-MM-DD, today, tomorrow, or +N days)
        expiry: String,
        /// Category (default: other)
        #[arg(short, long)]
        category: Option<String>,
        /// Unit (default: units)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an ingredient; omitted fields keep their current value
    Update {
        /// Ingredient ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New quantity
        #[arg(short, long)]
        quantity: Option<i64>,
        /// New unit
        #[arg(short, long)]
        unit: Option<String>,
        /// New expiry date (YYYY-MM-DD, today, tomorrow, or +N days)
        #[arg(short, long)]
        expiry: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an ingredient by ID
    Delete {
        /// Ingredient ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a random ingredient expiring within two weeks
    AddRandom {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a random ingredient
    RemoveRandom {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// List all recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with what you have and what you need
    Show {
        /// Recipe ID or name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Logs go to stderr so `--json` output stays clean. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn receipt_extractor(config: &Config, demo: bool) -> Result<Arc<dyn ReceiptExtractor>> {
    match (&config.openrouter_api_key, demo) {
        (Some(key), false) => Ok(Arc::new(OpenRouterClient::new(
            key.clone(),
            config.openrouter_model.clone(),
        )?)),
        (None, false) => {
            warn!(
                "{} is not set, receipt scanning runs in demo mode",
                config::API_KEY_VAR
            );
            Ok(Arc::new(DemoReceiptExtractor::default()))
        }
        (_, true) => Ok(Arc::new(DemoReceiptExtractor::default())),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    let db = Database::open(&config.db_path)?;
    db.seed_recipes()?;

    match cli.command {
        Commands::Inventory { command } => match command {
            InventoryCommands::List { json } => cmd_inventory_list(&db, json),
            InventoryCommands::Add {
                name,
                quantity,
                expiry,
                category,
                unit,
                json,
            } => cmd_inventory_add(&db, &name, quantity, &expiry, category, unit, json),
            InventoryCommands::Update {
                id,
                name,
                category,
                quantity,
                unit,
                expiry,
                json,
            } => cmd_inventory_update(
                &db,
                id,
                name,
                category,
                quantity,
                unit,
                expiry.as_deref(),
                json,
            ),
            InventoryCommands::Delete { id, json } => cmd_inventory_delete(&db, id, json),
            InventoryCommands::AddRandom { json } => cmd_inventory_add_random(&db, json),
            InventoryCommands::RemoveRandom { json } => cmd_inventory_remove_random(&db, json),
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::List { json } => cmd_recipe_list(&db, json),
            RecipeCommands::Show { recipe, json } => cmd_recipe_show(&db, &recipe, json),
        },
        Commands::Suggest { json } => cmd_suggest(&db, json),
        Commands::Scan {
            image,
            demo,
            add,
            json,
        } => {
            let extractor = receipt_extractor(&config, demo)?;
            cmd_scan(&db, extractor.as_ref(), &image, add, json).await
        }
        Commands::Serve {
            port,
            bind,
            demo_receipts,
        } => {
            let extractor = receipt_extractor(&config, demo_receipts)?;
            info!(
                data_dir = %config.data_dir.display(),
                db = %config.db_path.display(),
                "starting fridge API"
            );
            if bind != "127.0.0.1" && bind != "localhost" {
                warn!(
                    "Listening on {bind} without authentication. Any device on your network can change your inventory."
                );
            }
            server::start_server(db, extractor, port, &bind).await
        }
    }
}
