use actix_web::{error::JsonPayloadError, web, HttpRequest};
use tracing::debug;

use crate::error::AppError;
use crate::handlers::{admin_handler, health, user_handler};
use crate::server::app_state::AppState;

/// Register shared state in the shape the handlers and extractors expect.
pub fn configure_app_data(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::from(state.admin_signer.clone()))
            .app_data(web::Data::new(state))
            .app_data(json_config());
    }
}

/// Malformed JSON bodies answer with the regular error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err: JsonPayloadError, req: &HttpRequest| {
            debug!("Rejected JSON body for {}: {}", req.path(), err);
            AppError::InvalidRequest(format!("Invalid request body: {}", err)).into()
        })
}

/// Route table
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health endpoints
        .route("/health", web::get().to(health::health_check))
        .route("/health/ready", web::get().to(health::readiness_check))
        // Admin endpoints
        .service(
            web::scope("/api/admin")
                .route("/login", web::post().to(admin_handler::login))
                .route("/logout", web::post().to(admin_handler::logout))
                .route("/users", web::get().to(admin_handler::list_users))
                .route("/register-user", web::post().to(admin_handler::register_user))
                .route("/users/{id}", web::put().to(admin_handler::update_user))
                .route("/users/{id}", web::delete().to(admin_handler::delete_user))
                .route("/generate-link", web::post().to(admin_handler::generate_link)),
        )
        // User endpoints
        .service(
            web::scope("/api/user")
                .route("/login", web::post().to(user_handler::login))
                .route("/logout", web::post().to(user_handler::logout)),
        )
        .route("/user/{token}", web::get().to(user_handler::view_profile));
}
