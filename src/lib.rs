// Re-export core functionality for external use
pub use async_trait::async_trait;

// Core module definitions
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

// Unified error handling
pub use error::{AppError, Result};

// Essential re-exports for convenience
pub use server::{app_state::AppState, startup::start_server};

pub use config::settings::{AccessConfig, AdminConfig, Config, DatabaseConfig, ServerConfig};

// Storage abstractions
pub use storage::{
    init_storage, memory::MemoryStorage, mysql::MySqlStorage, AccessLinkStore, Result as StorageResult,
    Storage, StorageError, UserStore,
};

// Model exports
pub use models::{AccessLink, User, UserProfile};

// Access links and admin sessions
pub use auth::{AccessGate, AdminSession, AdminSessionSigner, GateError, LinkState};

pub use services::{LogNotifier, RegistrationNotifier, RegistrationService};

// Version and build information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
