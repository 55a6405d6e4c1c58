pub mod admin;
pub mod gate;
pub mod password;
pub mod token;

pub use admin::{AdminClaims, AdminSession, AdminSessionSigner};
pub use gate::{AccessGate, GateError, LinkState};

use crate::error::AppError;

/// Admin authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication result type
pub type Result<T> = std::result::Result<T, AuthError>;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::auth("Invalid username or password"),
            AuthError::InvalidToken(_) | AuthError::SessionExpired | AuthError::AuthenticationRequired => {
                AppError::auth("Admin login required")
            }
            AuthError::Internal(msg) => AppError::internal(msg),
        }
    }
}
