//! Model configuration store
//!
//! The relay core only ever reads the active model. The CRUD operations exist
//! for the admin surface and serialise their writes.

pub mod json_file;
pub mod types;

pub use json_file::JsonModelStore;
pub use types::{ModelConfig, ModelsDocument, StoreError};

use async_trait::async_trait;

/// Read side of the store, consulted once per relay call
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// The single model flagged active, if any
    async fn active_model(&self) -> Result<Option<ModelConfig>, StoreError>;
}
