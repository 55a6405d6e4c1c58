// Centralized configuration constants

// HTTP
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_WORKER_THREADS: usize = 4;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

// Database
pub const DEFAULT_DB_POOL: u32 = 5;
pub const DEFAULT_DB_CONN_TIMEOUT_SECS: u64 = 30;

// Admin session
pub const ADMIN_SESSION_COOKIE: &str = "admin-session";
pub const DEFAULT_ADMIN_SESSION_TTL_HOURS: i64 = 24;

// Access links
pub const DEFAULT_ADMIN_LINK_TTL_DAYS: i64 = 7;
pub const DEFAULT_SELF_LINK_TTL_HOURS: i64 = 24;
/// Legacy JSON view tokens older than this are refused.
pub const LEGACY_TOKEN_MAX_AGE_DAYS: i64 = 30;
/// Ledger inserts that hit the unique constraint are retried this many times in total.
pub const MAX_ISSUE_ATTEMPTS: usize = 3;
/// Bytes of OS randomness in each token nonce.
pub const TOKEN_NONCE_BYTES: usize = 16;

// Registration numbers
pub const REGISTRATION_NUMBER_PREFIX: &str = "MOH";
pub const MAX_REGISTRATION_NUMBER_ATTEMPTS: usize = 5;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

// CORS
pub const DEFAULT_CORS_MAX_AGE_SECS: usize = 3600;
