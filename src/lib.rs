pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CartCommand, CliConfig};

pub use adapters::{file::FileStorage, memory::MemoryStorage};
pub use config::CartConfig;
pub use core::cart::{CartStore, CorruptPolicy, Phase, RestoreOutcome, StoreOptions, DEFAULT_STORAGE_KEY};
pub use core::persist::PersistMode;
pub use core::provider::CartProvider;
pub use domain::model::{CartCollection, LineItem, NewProduct};
pub use domain::ports::KeyValueStore;
pub use utils::error::{CartError, Result};
