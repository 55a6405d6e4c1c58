use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{admin, AdminSession, AuthError};
use crate::config::constants::ADMIN_SESSION_COOKIE;
use crate::error::AppError;
use crate::server::app_state::AppState;
use crate::validation::{AdminLoginRequest, GenerateLinkRequest, RegisterUserRequest, UpdateUserRequest};

fn session_cookie(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(ADMIN_SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

/// POST /api/admin/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;

    if !admin::validate_credentials(&state.config.admin, &request.username, &request.password) {
        warn!("Admin login refused for {:?}", request.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.admin_signer.issue(&request.username, Utc::now())?;
    let cookie = session_cookie(
        token,
        state.admin_signer.ttl().num_seconds(),
        state.config.admin.cookie_secure,
    );
    info!("Admin {} logged in", request.username);

    Ok(HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "message": "Login successful",
    })))
}

/// POST /api/admin/logout
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    let mut cookie = session_cookie(String::new(), 0, state.config.admin.cookie_secure);
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "message": "Logged out",
    }))
}

/// GET /api/admin/users
pub async fn list_users(_admin: AdminSession, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = state.registration.list_users().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}

/// POST /api/admin/register-user
pub async fn register_user(
    admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, AppError> {
    let registered = state.registration.register_user(body.into_inner()).await?;
    info!(
        "{} registered {}",
        admin.username(),
        registered.user.registration_number
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Registration successful",
        "user": registered.user,
        "publicUrl": registered.link.public_url,
        "expiresAt": registered.link.expires_at,
    })))
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    _admin: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .registration
        .update_user(&path.into_inner(), body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": user,
    })))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    _admin: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    state.registration.delete_user(&id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deleted successfully",
        "deletedUserId": id,
    })))
}

/// POST /api/admin/generate-link
pub async fn generate_link(
    _admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<GenerateLinkRequest>,
) -> Result<HttpResponse, AppError> {
    let link = state.registration.generate_link(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "New access link generated successfully",
        "token": link.token,
        "publicUrl": link.public_url,
        "expiresAt": link.expires_at,
    })))
}
