// Administrator endpoints (session cookie required except login/logout)
pub mod admin_handler;

// Registered user endpoints and the profile view
pub mod user_handler;

// Health check handler
pub mod health;
