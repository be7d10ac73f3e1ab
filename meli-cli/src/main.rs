use clap::{Parser, Subcommand};
use serde_json::to_string_pretty;
use tracing::info;

mod logging;

use meli_core::app::{
    FindProductsByCategory, GetAllProducts, GetPaymentMethods, GetProduct, GetProductComments,
    GetReviewSummary, GetSeller, PurchaseProduct, SearchProducts,
};
use meli_core::services::ProductDetailsService;
use meli_core::storage::{build_store, seed_sqlite_from_files};
use meli_core::{CatalogConfig, EntityId};

#[derive(Parser)]
#[command(name = "meli-cli")]
#[command(about = "Product detail catalog over the configured storage backend")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one product with category, seller, images, and price history
    Product {
        #[arg(long)]
        id: String,
        /// Print the bare product record without joins (null when missing)
        #[arg(long)]
        raw: bool,
    },
    /// List every product
    Products,
    /// Search products by title, description, brand, or model
    Search {
        #[arg(long)]
        query: String,
    },
    /// List products carrying the given category, with cover image and price
    ByCategory {
        #[arg(long)]
        id: String,
        /// Print the bare product records without the listing joins
        #[arg(long)]
        raw: bool,
    },
    /// List products offered by the given seller
    BySeller {
        #[arg(long)]
        id: String,
    },
    /// Show the comments left on a product
    Comments {
        #[arg(long)]
        id: String,
    },
    /// Show the review summary (average, total, histogram) for a product
    Reviews {
        #[arg(long)]
        id: String,
    },
    /// Show one seller
    Seller {
        #[arg(long)]
        id: String,
    },
    /// List enabled payment methods, most preferred first
    PaymentMethods,
    /// Buy a quantity of a product, decrementing its stock
    Purchase {
        #[arg(long)]
        id: String,
        #[arg(long)]
        quantity: u32,
    },
    /// Move a product to a new price, rewriting its price history
    SetPrice {
        #[arg(long)]
        id: String,
        #[arg(long)]
        price: f64,
    },
    /// Copy the flat-file seed collections into the SQLite database
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    logging::init_logging();

    let config = CatalogConfig::from_env();
    let store = build_store(&config)?;

    match cli.command {
        Commands::Product { id, raw } => {
            if raw {
                let product = GetProduct::new(&store).execute(&EntityId::from(id)).await?;
                println!("{}", to_string_pretty(&product)?);
            } else {
                let service = ProductDetailsService::new(&store);
                let details = service.product_with_details(&EntityId::from(id)).await?;
                println!("{}", to_string_pretty(&details)?);
            }
        }
        Commands::Products => {
            let products = GetAllProducts::new(&store).execute().await?;
            println!("{}", to_string_pretty(&products)?);
        }
        Commands::Search { query } => {
            let products = SearchProducts::new(&store).execute(&query).await?;
            println!("{}", to_string_pretty(&products)?);
        }
        Commands::ByCategory { id, raw } => {
            if raw {
                let products = FindProductsByCategory::new(&store)
                    .execute(&EntityId::from(id))
                    .await?;
                println!("{}", to_string_pretty(&products)?);
            } else {
                let service = ProductDetailsService::new(&store);
                let summaries = service.products_by_category(&EntityId::from(id)).await?;
                println!("{}", to_string_pretty(&summaries)?);
            }
        }
        Commands::BySeller { id } => {
            let service = ProductDetailsService::new(&store);
            let summaries = service.products_by_seller(&EntityId::from(id)).await?;
            println!("{}", to_string_pretty(&summaries)?);
        }
        Commands::Comments { id } => {
            let comments = GetProductComments::new(&store)
                .execute(&EntityId::from(id))
                .await?;
            println!("{}", to_string_pretty(&comments)?);
        }
        Commands::Reviews { id } => {
            let summary = GetReviewSummary::new(&store)
                .execute(&EntityId::from(id))
                .await?;
            println!("{}", to_string_pretty(&summary)?);
        }
        Commands::Seller { id } => {
            let seller = GetSeller::new(&store).execute(&EntityId::from(id)).await?;
            println!("{}", to_string_pretty(&seller)?);
        }
        Commands::PaymentMethods => {
            let methods = GetPaymentMethods::new(&store).execute().await?;
            println!("{}", to_string_pretty(&methods)?);
        }
        Commands::Purchase { id, quantity } => {
            let outcome = PurchaseProduct::new(&store)
                .execute(&EntityId::from(id), quantity)
                .await?;
            println!("{}", to_string_pretty(&outcome)?);
            // A rejected purchase is a business outcome, not a crash.
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Commands::SetPrice { id, price } => {
            let service = ProductDetailsService::new(&store);
            let details = service.update_price(&EntityId::from(id), price).await?;
            println!("{}", to_string_pretty(&details)?);
        }
        Commands::Seed => {
            seed_sqlite_from_files(&config).await?;
            info!(path = %config.database_path.display(), "seed finished");
            println!("seeded {}", config.database_path.display());
        }
    }

    Ok(())
}
