//! FreshCart CLI - inspect and maintain persisted storefront state.
//!
//! # Usage
//!
//! ```bash
//! # Print the persisted cart
//! fc-cli cart show
//!
//! # Empty the persisted cart
//! fc-cli cart clear
//!
//! # Quote shipping for the persisted cart
//! fc-cli cart quote --postcode "111 22" --city Stockholm --country SE
//!
//! # Print or clear the recently viewed list
//! fc-cli recent show
//! fc-cli recent clear
//! ```
//!
//! # Commands
//!
//! - `cart` - Show, clear, or quote shipping for the persisted cart
//! - `recent` - Show or clear recently viewed products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use freshcart_storefront::cart::ShippingAddress;
use freshcart_storefront::config::StorefrontConfig;
use freshcart_storefront::error::StorefrontError;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(author, version, about = "FreshCart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or modify the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Inspect or clear recently viewed products
    Recent {
        #[command(subcommand)]
        action: RecentCommand,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Print items, totals, and shipping
    Show,
    /// Empty the cart and forget shipping data
    Clear,
    /// Request a shipping quote and store the result
    Quote {
        /// Postal code (spaces are ignored)
        #[arg(short, long, requires = "city")]
        postcode: Option<String>,

        /// City
        #[arg(long, requires = "postcode")]
        city: Option<String>,

        /// ISO 3166-1 alpha-2 country code
        #[arg(long, default_value = "SE")]
        country: String,
    },
}

#[derive(Subcommand)]
enum RecentCommand {
    /// Print products, most recent first
    Show,
    /// Forget all viewed products
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("freshcart_storefront=info,fc_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = StorefrontConfig::from_env().map_err(StorefrontError::from)?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartCommand::Show => commands::cart::show(&config)?,
            CartCommand::Clear => commands::cart::clear(&config)?,
            CartCommand::Quote {
                postcode,
                city,
                country,
            } => {
                let address = postcode.map(|postcode| {
                    ShippingAddress::new(&postcode, city.as_deref().unwrap_or_default(), &country)
                });
                commands::cart::quote(&config, address).await?;
            }
        },
        Commands::Recent { action } => match action {
            RecentCommand::Show => commands::recently_viewed::show(&config)?,
            RecentCommand::Clear => commands::recently_viewed::clear(&config)?,
        },
    }
    Ok(())
}
