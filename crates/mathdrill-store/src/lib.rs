//! mathdrill-store: configuration and result persistence.
//!
//! Loads `mathdrill.toml` and implements the `ResultStore` capability for a
//! JSON directory and for in-memory use.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;

pub use config::{create_store, load_config, load_config_from, MathdrillConfig, StoreConfig};
pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
