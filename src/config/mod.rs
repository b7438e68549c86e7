//! Configuration management

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, FirebirdConfig, FuripsConfig, MySqlConfig, StorageConfig,
};
pub use secret::{secret_from, SecretString, SecretValue};
