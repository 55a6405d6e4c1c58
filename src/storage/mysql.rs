use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

use crate::config::settings::DatabaseConfig;
use crate::storage::{Result, Storage, StorageError};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(36) NOT NULL PRIMARY KEY,
        registration_number VARCHAR(32) NOT NULL,
        registration_form_title VARCHAR(255) NOT NULL DEFAULT '',
        title VARCHAR(32) NOT NULL,
        name VARCHAR(255) NOT NULL,
        father_husband_name VARCHAR(255) NOT NULL,
        mobile_no VARCHAR(20) NOT NULL,
        email_id VARCHAR(255) NOT NULL,
        date_of_birth VARCHAR(32) NOT NULL,
        passout_percentage DOUBLE NOT NULL,
        state VARCHAR(64) NOT NULL,
        address TEXT NOT NULL,
        course_name VARCHAR(255) NOT NULL,
        experience VARCHAR(255) NOT NULL,
        college_name VARCHAR(255) NOT NULL,
        photo_url TEXT NOT NULL,
        qr_code_url TEXT NULL,
        hashed_password VARCHAR(128) NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL,
        deleted_at BIGINT NULL,
        UNIQUE KEY uq_users_registration_number (registration_number),
        UNIQUE KEY uq_users_email (email_id),
        UNIQUE KEY uq_users_mobile (mobile_no),
        KEY idx_users_created_at (created_at)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"#,
    r#"CREATE TABLE IF NOT EXISTS access_links (
        token VARCHAR(191) CHARACTER SET ascii COLLATE ascii_bin NOT NULL PRIMARY KEY,
        registration_number VARCHAR(32) NOT NULL,
        is_used BOOLEAN NOT NULL DEFAULT FALSE,
        created_at BIGINT NOT NULL,
        expires_at BIGINT NOT NULL,
        used_at BIGINT NULL,
        KEY idx_access_links_registration_number (registration_number)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"#,
    // Tables created before the token column was case-sensitive.
    r#"ALTER TABLE access_links
        MODIFY token VARCHAR(191) CHARACTER SET ascii COLLATE ascii_bin NOT NULL"#,
];

/// MySQL storage implementation
pub struct MySqlStorage {
    sqlx_pool: MySqlPool,
}

impl MySqlStorage {
    /// Create new storage from URL and pool settings
    #[instrument(skip(url, config))]
    pub async fn new_with_config(url: &str, config: &DatabaseConfig) -> Result<Self> {
        let sqlx_pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to connect via sqlx: {}", e)))?;
        info!("MySQL pool ready (max_connections={})", config.max_connections);
        Ok(Self { sqlx_pool })
    }

    pub fn get_sqlx_pool(&self) -> &MySqlPool {
        &self.sqlx_pool
    }

    /// Create tables when missing
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.sqlx_pool)
                .await
                .map_err(|e| StorageError::Database(format!("Failed to initialize schema: {}", e)))?;
        }
        debug!("MySQL schema verified");
        Ok(())
    }
}

/// Stored millisecond timestamps back to `DateTime`.
pub(crate) fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        _ => Err(StorageError::InvalidData(format!("Invalid timestamp: {}", millis))),
    }
}

#[async_trait]
impl Storage for MySqlStorage {
    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.sqlx_pool)
            .await
            .map_err(StorageError::from)?;
        Ok(true)
    }

    fn storage_type(&self) -> &'static str {
        "mysql"
    }

    async fn close(&self) -> Result<()> {
        self.sqlx_pool.close().await;
        Ok(())
    }
}
