pub mod memory;
pub mod mysql;

mod mysql_access_link;
mod mysql_user;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    config::settings::DatabaseConfig,
    error::{AppError, Result as AppResult},
    models::{AccessLink, User},
};

use self::memory::MemoryStorage;
use self::mysql::MySqlStorage;

/// Storage Result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Error types for storage operations
#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Query timeout: {0}")]
    QueryTimeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) => Self::Database(db_err.to_string()),
            sqlx::Error::Io(io_err) => Self::Connection(io_err.to_string()),
            sqlx::Error::PoolTimedOut => Self::PoolExhausted("Connection pool timeout".to_string()),
            sqlx::Error::PoolClosed => Self::Connection("Connection pool closed".to_string()),
            _ => Self::Database(error.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::Duplicate(msg) => AppError::Conflict(msg),
            StorageError::InvalidData(msg) => AppError::Validation(msg),
            StorageError::Connection(msg)
            | StorageError::PoolExhausted(msg)
            | StorageError::QueryTimeout(msg) => AppError::ServiceUnavailable(msg),
            _ => AppError::Storage(err.to_string()),
        }
    }
}

/// Persistence of access links (the ledger).
///
/// `token` is unique: inserting an existing token must fail with
/// [`StorageError::Duplicate`] and leave the stored row untouched.
#[async_trait]
pub trait AccessLinkStore: Send + Sync {
    async fn insert_access_link(&self, link: &AccessLink) -> Result<()>;

    async fn find_access_link(&self, token: &str) -> Result<Option<AccessLink>>;

    /// Mark the link used. Returns `false` when no row has this token.
    /// A second call keeps the first `used_at`.
    async fn mark_access_link_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool>;
}

/// Persistence of registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; unique email, mobile or registration number yields `Duplicate`.
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn get_user_by_registration_number(&self, registration_number: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_email_or_mobile(&self, email: &str, mobile_no: &str) -> Result<Option<User>>;
    /// Users without `deleted_at`, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;
    /// Replace the stored row with the same id. Returns `false` when absent.
    async fn update_user(&self, user: &User) -> Result<bool>;
    /// Returns `false` when absent.
    async fn delete_user(&self, id: &str) -> Result<bool>;
}

/// Complete storage backend
#[async_trait]
pub trait Storage: AccessLinkStore + UserStore {
    /// Health check with connection validation
    async fn health_check(&self) -> Result<bool>;

    /// Get storage type identifier
    fn storage_type(&self) -> &'static str;

    /// Close all connections gracefully
    async fn close(&self) -> Result<()>;
}

/// Storage initialization: MySQL when a URL is configured, memory otherwise
#[instrument(skip(config))]
pub async fn init_storage(config: &DatabaseConfig) -> AppResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.url.as_deref() {
        Some(url) if url.starts_with("mysql://") => {
            info!("Using MySQL storage");
            let storage = MySqlStorage::new_with_config(url, config).await?;
            storage.init_schema().await?;
            Arc::new(storage)
        }
        Some(_) => {
            return Err(AppError::config("DATABASE_URL must start with mysql://"));
        }
        None => {
            warn!("DATABASE_URL not set - using in-memory storage, data is lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    if !storage.health_check().await? {
        return Err(AppError::ServiceUnavailable("Storage health check failed".to_string()));
    }

    info!("Storage layer initialized: {}", storage.storage_type());
    Ok(storage)
}
