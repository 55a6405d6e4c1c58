use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::AppError;
use crate::server::app_state::AppState;
use crate::validation::{LogoutRequest, UserLoginRequest};

/// POST /api/user/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<UserLoginRequest>,
) -> Result<HttpResponse, AppError> {
    let link = state.registration.user_login(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "profileLink": link.public_url,
        "token": link.token,
        "expiresAt": link.expires_at,
    })))
}

/// POST /api/user/logout
pub async fn logout(
    state: web::Data<AppState>,
    body: web::Json<LogoutRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;
    state.registration.user_logout(request.token.trim()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}

/// GET /user/{token}
pub async fn view_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let profile = state.registration.view_profile(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": profile,
    })))
}
