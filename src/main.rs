use cart_store::utils::error::ErrorSeverity;
use cart_store::utils::logger;
use cart_store::{
    CartCollection, CartCommand, CartError, CartProvider, CliConfig, FileStorage, NewProduct,
};
use clap::Parser;

fn exit_with(e: &CartError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn print_cart(collection: &CartCollection, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(collection)?);
        return Ok(());
    }

    if collection.is_empty() {
        println!("🛒 Cart is empty");
        return Ok(());
    }

    for item in collection.items() {
        println!(
            "{:<12} {:<30} x{:<4} @ {:>9.2}",
            item.id, item.title, item.quantity, item.price
        );
    }
    println!(
        "🛒 {} item(s), {} unit(s), subtotal {:.2}",
        collection.len(),
        collection.total_quantity(),
        collection.subtotal()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let level = config.logging.level.as_deref();
    if config.logging.json {
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }
    tracing::debug!("Resolved config: {:?}", config);

    let storage = FileStorage::new(&config.storage.data_dir);
    let mut provider = match CartProvider::mount(storage, config.store_options()) {
        Ok(provider) => provider,
        Err(e) => exit_with(&e),
    };
    let cart = match provider.cart() {
        Ok(cart) => cart,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = cart.wait_ready().await {
        exit_with(&e);
    }

    match cli.command {
        CartCommand::List => {}
        CartCommand::Add {
            id,
            title,
            image_url,
            price,
        } => cart.add_to_cart(NewProduct::new(id, title, image_url, price)),
        CartCommand::Increment { id } => cart.increment(&id),
        CartCommand::Decrement { id } => cart.decrement(&id),
    }

    let collection = cart.collection();
    drop(cart);
    provider.shutdown().await;

    print_cart(&collection, cli.json)
}
