//! Samagri Storefront CLI

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use samagri::cart::UserId;
use samagri::catalog::ItemRef;
use samagri_client::api::{ApiConfig, CatalogEntry};
use samagri_client::cart::CartView;
use samagri_client::checkout::AddressId;
use samagri_client::context::{ClientConfig, ClientContext};

mod render;

#[derive(Debug, Parser)]
#[command(name = "samagri-demo", about = "Samagri storefront CLI", long_about = None)]
struct Cli {
    /// Backend API base URL
    #[arg(long, env = "SAMAGRI_API_URL", default_value = "http://localhost:8081/api")]
    api_url: String,

    /// Directory for the persisted cart
    #[arg(long, env = "SAMAGRI_STATE_DIR", default_value = ".samagri")]
    state_dir: PathBuf,

    /// Seconds between discount polls
    #[arg(long, env = "SAMAGRI_POLL_SECS", default_value_t = 60)]
    poll_secs: u64,

    /// Acting user id; 0 is the anonymous user
    #[arg(long, env = "SAMAGRI_USER_ID", default_value_t = 0)]
    user: UserId,

    /// Log level filter
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart, recovering it from the backend when needed
    Show,
    /// Add a product or bundle to the cart
    Add(AddArgs),
    /// Remove a line from the cart
    Remove(ItemArgs),
    /// Raise a line's quantity
    Inc(AdjustArgs),
    /// Lower a line's quantity
    Dec(AdjustArgs),
    /// Place an order for the cart
    Checkout(CheckoutArgs),
    /// Delete the cart locally and on the backend
    Delete,
    /// Show the active discount code
    Discount,
    /// Stream cart snapshots and notices until interrupted
    Watch,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct ItemArgs {
    /// Target a product by id
    #[arg(long)]
    product: Option<u64>,

    /// Target a bundle by id
    #[arg(long)]
    bundle: Option<u64>,
}

impl ItemArgs {
    fn item_ref(&self) -> Result<ItemRef, String> {
        match (self.product, self.bundle) {
            (Some(id), None) => Ok(ItemRef::Product(id)),
            (None, Some(id)) => Ok(ItemRef::Bundle(id)),
            _ => Err("exactly one of --product or --bundle is required".to_owned()),
        }
    }
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    item: ItemArgs,

    /// Quantity to add
    #[arg(long, default_value_t = 1)]
    qty: u32,
}

#[derive(Debug, Args)]
struct AdjustArgs {
    #[command(flatten)]
    item: ItemArgs,

    /// Amount to adjust by
    #[arg(long, default_value_t = 1)]
    by: u32,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Delivery address id
    #[arg(long)]
    address: AddressId,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let context = ClientContext::initialize(ClientConfig {
        api: ApiConfig {
            base_url: cli.api_url,
        },
        store_dir: cli.state_dir,
        discount_poll_interval: Duration::from_secs(cli.poll_secs),
        user: cli.user,
    })
    .map_err(|error| format!("failed to initialize client: {error}"))?;

    let result = match cli.command {
        Commands::Show => show(&context).await,
        Commands::Add(args) => add(&context, args).await,
        Commands::Remove(args) => remove(&context, args).await,
        Commands::Inc(args) => increment(&context, args).await,
        Commands::Dec(args) => decrement(&context, args).await,
        Commands::Checkout(args) => checkout(&context, args).await,
        Commands::Delete => delete(&context).await,
        Commands::Discount => discount(&context).await,
        Commands::Watch => watch(&context).await,
    };

    // Queued mirror writes drain before the process exits.
    context.shutdown().await;

    result
}

async fn show(context: &ClientContext) -> Result<(), String> {
    let view = context
        .cart
        .hydrate()
        .await
        .map_err(|error| format!("failed to load cart: {error}"))?;

    print_view(view.as_ref())
}

async fn add(context: &ClientContext, args: AddArgs) -> Result<(), String> {
    let entry = fetch_entry(context, &args.item).await?;

    let view = context
        .cart
        .add_item(&entry.listing, args.qty)
        .await
        .map_err(|error| format!("failed to add {}: {error}", entry.name))?;

    println!("added {}", entry.name);

    print_view(Some(&view))
}

async fn remove(context: &ClientContext, args: ItemArgs) -> Result<(), String> {
    let item = args.item_ref()?;

    let view = context
        .cart
        .remove_item(item)
        .await
        .map_err(|error| format!("failed to remove {item}: {error}"))?;

    print_view(view.as_ref())
}

async fn increment(context: &ClientContext, args: AdjustArgs) -> Result<(), String> {
    let item = args.item.item_ref()?;

    let view = context
        .cart
        .increment_quantity(item, args.by)
        .await
        .map_err(|error| format!("failed to raise {item}: {error}"))?;

    print_view(view.as_ref())
}

async fn decrement(context: &ClientContext, args: AdjustArgs) -> Result<(), String> {
    let item = args.item.item_ref()?;

    let view = context
        .cart
        .decrement_quantity(item, args.by)
        .await
        .map_err(|error| format!("failed to lower {item}: {error}"))?;

    print_view(view.as_ref())
}

async fn checkout(context: &ClientContext, args: CheckoutArgs) -> Result<(), String> {
    let placed = context
        .checkout
        .place_order(args.address)
        .await
        .map_err(|error| format!("checkout failed: {error}"))?;

    println!("order {} placed", placed.order_id);
    println!("paid {}", render::rupees(placed.totals.grand_total));

    Ok(())
}

async fn delete(context: &ClientContext) -> Result<(), String> {
    context
        .cart
        .delete_cart()
        .await
        .map_err(|error| format!("failed to delete cart: {error}"))?;

    println!("cart deleted");

    Ok(())
}

async fn discount(context: &ClientContext) -> Result<(), String> {
    let mut feed = context.discounts.clone();

    // The feed publishes once the first poll completes.
    feed.changed()
        .await
        .map_err(|error| format!("discount watcher stopped: {error}"))?;

    match feed.active() {
        Some(code) => {
            println!("{} ({}% off)", code.code, code.rate.as_percent());

            if let Some(expiry) = code.expires_on {
                println!("valid through {expiry}");
            }
        }
        None => println!("no active discount"),
    }

    Ok(())
}

async fn watch(context: &ClientContext) -> Result<(), String> {
    let mut snapshots = context.cart_updates();
    let mut notices = context.notices.subscribe();

    println!("watching the cart, press Ctrl+C to stop");

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                return result.map_err(|error| format!("failed to install Ctrl+C handler: {error}"));
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }

                let view = snapshots.borrow_and_update().clone();

                print_view(view.as_ref())?;
            }
            notice = notices.recv() => {
                match notice {
                    Ok(notice) => println!("{}", notice.message()),
                    Err(RecvError::Lagged(missed)) => println!("missed {missed} notices"),
                    Err(RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}

async fn fetch_entry(context: &ClientContext, item: &ItemArgs) -> Result<CatalogEntry, String> {
    match item.item_ref()? {
        ItemRef::Product(id) => context
            .catalog
            .product(id)
            .await
            .map_err(|error| format!("failed to fetch product {id}: {error}")),
        ItemRef::Bundle(id) => context
            .catalog
            .bundle(id)
            .await
            .map_err(|error| format!("failed to fetch bundle {id}: {error}")),
    }
}

fn print_view(view: Option<&CartView>) -> Result<(), String> {
    match view {
        Some(view) => render::write_cart(&mut io::stdout().lock(), view)
            .map_err(|error| format!("failed to render cart: {error}")),
        None => {
            println!("cart is empty");

            Ok(())
        }
    }
}
