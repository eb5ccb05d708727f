pub mod cart;
pub mod persist;
pub mod provider;

pub use crate::domain::model::{CartCollection, LineItem, NewProduct};
pub use crate::domain::ports::KeyValueStore;
pub use crate::utils::error::Result;
