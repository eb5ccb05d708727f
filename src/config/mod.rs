pub mod toml_config;

pub use toml_config::CartConfig;

#[cfg(feature = "cli")]
use crate::core::persist::PersistMode;
#[cfg(feature = "cli")]
use crate::utils::{error::Result, validation::Validate};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "cart")]
#[command(about = "Inspect and edit the locally persisted shopping cart")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the stored cart (overrides storage.data_dir)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Storage key of the cart slot (overrides storage.key)
    #[arg(long)]
    pub key: Option<String>,

    /// Write snapshots through a single ordered writer
    #[arg(long)]
    pub serialized: bool,

    /// Print the cart as the stored JSON array
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CartCommand,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum CartCommand {
    /// Show the cart contents
    List,
    /// Add a product, or bump its quantity if already in the cart
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        price: f64,
    },
    /// Increase the quantity of an item
    Increment { id: String },
    /// Decrease the quantity of an item, removing it at zero
    Decrement { id: String },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the file configuration (or defaults), applies flag overrides and validates.
    pub fn resolve(&self) -> Result<CartConfig> {
        let mut config = match &self.config {
            Some(path) => CartConfig::from_file(path)?,
            None => CartConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(key) = &self.key {
            config.storage.key = key.clone();
        }
        if self.serialized {
            config.persistence.mode = PersistMode::Serialized;
        }

        config.validate()?;
        Ok(config)
    }
}
