//! Soil2Spoon command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the token is kept between invocations)
//! s2s login -e cook@example.com -p hunter2
//!
//! # Browse
//! s2s products --category pickles
//! s2s product mango-pickle
//!
//! # Cart and checkout
//! s2s cart add mango-pickle -q 2
//! s2s checkout --address-id 3 --payment upi
//! ```
//!
//! # Environment Variables
//!
//! See `soil2spoon_storefront::config` for the full list. `RUST_LOG`
//! controls log output (stderr).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soil2spoon_core::{AddressId, CategoryId, ProductId, ReviewId};
use soil2spoon_storefront::types::PaymentMethod;
use soil2spoon_storefront::{Storefront, StorefrontConfig};

mod commands;
mod output;

use commands::CliError;

#[derive(Parser)]
#[command(name = "s2s")]
#[command(author, version, about = "Soil2Spoon storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the token
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        name: String,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Request a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with a reset token
    ResetPassword {
        #[arg(short, long)]
        token: String,
        #[arg(short, long)]
        password: String,
    },
    /// List products
    Products {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Show one product
    Product { slug: String },
    /// List featured products
    Featured,
    /// List trending products
    Trending,
    /// List categories
    Categories,
    /// List reviews for a product
    Reviews { product_id: ProductId },
    /// Write reviews
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Work with the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order from the cart
    Checkout(CheckoutArgs),
    /// List past orders
    Orders,
    /// Manage saved addresses
    Addresses {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Catalog administration (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Frequently asked questions
    Faqs,
    /// Shipping, returns and contact pages
    Info {
        #[command(subcommand)]
        page: InfoPage,
    },
}

#[derive(Subcommand)]
enum ReviewAction {
    /// Review a product
    Add {
        product_id: ProductId,
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long)]
        text: String,
    },
    /// Edit one of your reviews
    Edit {
        product_id: ProductId,
        review_id: ReviewId,
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long)]
        text: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product by slug
    Add {
        slug: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        product_id: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { product_id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(clap::Args)]
struct CheckoutArgs {
    /// Ship to a saved address
    #[arg(long, conflicts_with_all = ["name", "phone", "line1", "line2", "city", "state", "pincode"])]
    address_id: Option<AddressId>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    line1: Option<String>,
    #[arg(long)]
    line2: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    pincode: Option<String>,
    /// cod, card, upi or netbanking
    #[arg(long, default_value = "cod")]
    payment: PaymentMethod,
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        line1: String,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        pincode: String,
        /// Make this the default address
        #[arg(long)]
        default: bool,
    },
    /// Delete a saved address
    Delete { id: AddressId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Manage products
    Product {
        #[command(subcommand)]
        action: AdminProductAction,
    },
    /// Moderate reviews
    Review {
        #[command(subcommand)]
        action: AdminReviewAction,
    },
}

#[derive(Subcommand)]
enum AdminProductAction {
    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
        /// Price in rupees
        #[arg(long)]
        price: i64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum AdminReviewAction {
    /// Delete any review
    Delete {
        product_id: ProductId,
        review_id: ReviewId,
    },
}

#[derive(Subcommand)]
enum InfoPage {
    Shipping,
    Returns,
    Contact,
    /// Seller and regulatory information
    Site {
        #[arg(long)]
        product_id: Option<ProductId>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "soil2spoon_storefront=info,soil2spoon_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storefront = match Storefront::with_file_tokens(config) {
        Ok(storefront) => storefront,
        Err(e) => {
            e.report();
            tracing::error!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    let result = run(&storefront, cli.command).await;
    storefront.shutdown().await;

    if let Err(e) = result {
        if let CliError::Storefront(inner) = &e {
            inner.report();
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(storefront: &Storefront, command: Commands) -> Result<(), CliError> {
    commands::restore_session(storefront).await;

    match command {
        Commands::Login { email, password } => {
            commands::auth::login(storefront, &email, &password).await?;
        }
        Commands::Signup {
            email,
            password,
            name,
        } => commands::auth::signup(storefront, &email, &password, &name).await?,
        Commands::Logout => commands::auth::logout(storefront).await,
        Commands::Whoami => commands::auth::whoami(storefront)?,
        Commands::ForgotPassword { email } => {
            commands::auth::forgot_password(storefront, &email).await?;
        }
        Commands::ResetPassword { token, password } => {
            commands::auth::reset_password(storefront, &token, &password).await?;
        }
        Commands::Products {
            category,
            page,
            size,
        } => {
            commands::catalog::products(storefront, category.map(CategoryId::new), page, size)
                .await?;
        }
        Commands::Product { slug } => commands::catalog::product(storefront, &slug).await?,
        Commands::Featured => commands::catalog::featured(storefront).await?,
        Commands::Trending => commands::catalog::trending(storefront).await?,
        Commands::Categories => commands::catalog::categories(storefront).await?,
        Commands::Reviews { product_id } => {
            commands::catalog::reviews(storefront, product_id).await?;
        }
        Commands::Review { action } => match action {
            ReviewAction::Add {
                product_id,
                rating,
                text,
            } => commands::catalog::add_review(storefront, product_id, rating, text).await?,
            ReviewAction::Edit {
                product_id,
                review_id,
                rating,
                text,
            } => {
                commands::catalog::edit_review(storefront, product_id, review_id, rating, text)
                    .await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront),
            CartAction::Add { slug, quantity } => {
                commands::cart::add(storefront, &slug, quantity).await?;
            }
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(storefront, product_id, quantity)?,
            CartAction::Remove { product_id } => commands::cart::remove(storefront, product_id)?,
            CartAction::Clear => commands::cart::clear(storefront),
        },
        Commands::Checkout(args) => {
            let shipping = commands::orders::Shipping {
                address_id: args.address_id,
                name: args.name,
                phone: args.phone,
                line1: args.line1,
                line2: args.line2,
                city: args.city,
                state: args.state,
                pincode: args.pincode,
            };
            commands::orders::checkout(storefront, shipping, args.payment).await?;
        }
        Commands::Orders => commands::orders::list(storefront).await?,
        Commands::Addresses { action } => match action {
            AddressAction::List => commands::addresses::list(storefront).await?,
            AddressAction::Add {
                name,
                phone,
                line1,
                line2,
                city,
                state,
                pincode,
                default,
            } => {
                let request = soil2spoon_storefront::types::AddressRequest {
                    name,
                    phone,
                    address_line1: line1,
                    address_line2: line2,
                    city,
                    state,
                    pincode,
                    is_default: default.then_some(true),
                };
                commands::addresses::add(storefront, &request).await?;
            }
            AddressAction::Delete { id } => commands::addresses::delete(storefront, id).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Product { action } => match action {
                AdminProductAction::Create {
                    name,
                    slug,
                    price,
                    category,
                    description,
                    image,
                } => {
                    let request = soil2spoon_storefront::types::ProductRequest {
                        name: Some(name),
                        slug: Some(slug),
                        price: Some(soil2spoon_core::Price::from_rupees(price)),
                        category_id: category.map(CategoryId::new),
                        description,
                        image,
                        ..Default::default()
                    };
                    commands::admin::create_product(storefront, &request).await?;
                }
                AdminProductAction::Delete { id } => {
                    commands::admin::delete_product(storefront, id).await?;
                }
            },
            AdminAction::Review { action } => match action {
                AdminReviewAction::Delete {
                    product_id,
                    review_id,
                } => commands::admin::delete_review(storefront, product_id, review_id).await?,
            },
        },
        Commands::Faqs => commands::content::faqs(storefront).await,
        Commands::Info { page } => match page {
            InfoPage::Shipping => commands::content::shipping(storefront).await,
            InfoPage::Returns => commands::content::returns(storefront).await,
            InfoPage::Contact => commands::content::contact(storefront).await,
            InfoPage::Site { product_id } => {
                commands::content::site_information(storefront, product_id).await;
            }
        },
    }
    Ok(())
}
