//! Administrator sessions.
//!
//! A successful login yields a compact HS256 token
//! (`base64url(header).base64url(claims).base64url(mac)`) that travels in the
//! `admin-session` cookie. Nothing is stored server side: the signature and
//! the `exp` claim are the whole session.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::auth::AuthError;
use crate::config::constants::ADMIN_SESSION_COOKIE;
use crate::config::settings::AdminConfig;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct SessionHeader {
    alg: String,
    typ: String,
}

impl SessionHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by an admin session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin username
    pub sub: String,
    /// Session id, unique per login
    pub sid: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Constant-time check of a login attempt against the configured account.
pub fn validate_credentials(config: &AdminConfig, username: &str, password: &str) -> bool {
    if config.username.is_empty() || config.password.is_empty() {
        return false;
    }
    let user_ok = username.as_bytes().ct_eq(config.username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(config.password.as_bytes());
    (user_ok & pass_ok).into()
}

/// Signs and verifies admin session tokens.
pub struct AdminSessionSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl AdminSessionSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Signer from `ADMIN_SESSION_SECRET`, or a random per-process secret.
    pub fn from_config(config: &AdminConfig) -> Self {
        let secret = match config.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
            _ => {
                warn!("ADMIN_SESSION_SECRET not set - generated a random secret, admin sessions will not survive a restart");
                let mut secret = vec![0u8; 32];
                OsRng.fill_bytes(&mut secret);
                secret
            }
        };
        Self::new(secret, config.session_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Internal(format!("Invalid HMAC key: {}", e)))
    }

    /// New session token for `username`, valid for the configured ttl.
    pub fn issue(&self, username: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = AdminClaims {
            sub: username.to_string(),
            sid: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &AdminClaims) -> Result<String, AuthError> {
        let header_json = serde_json::to_vec(&SessionHeader::hs256())
            .map_err(|e| AuthError::Internal(format!("Failed to serialize header: {}", e)))?;
        let claims_json = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Internal(format!("Failed to serialize claims: {}", e)))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Check structure, header, signature and expiry.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AdminClaims, AuthError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("malformed session".to_string()));
        };

        let header: SessionHeader = serde_json::from_slice(&b64_decode(header_b64)?)
            .map_err(|_| AuthError::InvalidToken("bad session header".to_string()))?;
        if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
            return Err(AuthError::InvalidToken("unsupported session header".to_string()));
        }

        let mut mac = self.mac()?;
        mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
        mac.verify_slice(&b64_decode(sig_b64)?)
            .map_err(|_| AuthError::InvalidToken("bad session signature".to_string()))?;

        let claims: AdminClaims = serde_json::from_slice(&b64_decode(claims_b64)?)
            .map_err(|_| AuthError::InvalidToken("bad session claims".to_string()))?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::SessionExpired);
        }
        Ok(claims)
    }
}

fn b64_decode(segment: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(segment.as_bytes())
        .map_err(|_| AuthError::InvalidToken("session is not base64url".to_string()))
}

/// Extractor for routes that need a logged-in administrator.
///
/// Reads the `admin-session` cookie and verifies it with the
/// [`AdminSessionSigner`] registered as app data.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminClaims);

impl AdminSession {
    pub fn username(&self) -> &str {
        &self.0.sub
    }

    fn extract(req: &HttpRequest) -> Result<Self, AppError> {
        let signer = req
            .app_data::<web::Data<AdminSessionSigner>>()
            .ok_or_else(|| AppError::internal("admin session signer not configured"))?;

        let cookie = req
            .cookie(ADMIN_SESSION_COOKIE)
            .ok_or(AuthError::AuthenticationRequired)?;

        match signer.verify(cookie.value(), Utc::now()) {
            Ok(claims) => Ok(AdminSession(claims)),
            Err(e) => {
                debug!("Rejected admin session: {}", e);
                Err(e.into())
            }
        }
    }
}

impl FromRequest for AdminSession {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::extract(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> AdminSessionSigner {
        AdminSessionSigner::new(b"test-secret".to_vec(), Duration::hours(24))
    }

    fn admin_config() -> AdminConfig {
        AdminConfig {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
            ..AdminConfig::default()
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let signer = signer();
        let now = Utc::now();
        let token = signer.issue("admin", now).unwrap();
        let claims = signer.verify(&token, now).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_each_login_gets_its_own_session_id() {
        let signer = signer();
        let now = Utc::now();
        let a = signer.verify(&signer.issue("admin", now).unwrap(), now).unwrap();
        let b = signer.verify(&signer.issue("admin", now).unwrap(), now).unwrap();
        assert_ne!(a.sid, b.sid);
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let signer = signer();
        let issued = Utc::now();
        let token = signer.issue("admin", issued).unwrap();
        let later = issued + Duration::hours(24);
        assert!(matches!(signer.verify(&token, later), Err(AuthError::SessionExpired)));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let signer = signer();
        let now = Utc::now();
        let token = signer.issue("admin", now).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = AdminClaims {
            sub: "root".to_string(),
            sid: "x".to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + 10 * 365 * 24 * 3600,
        };
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            parts[2]
        );
        assert!(matches!(signer.verify(&forged, now), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let now = Utc::now();
        let token = signer().issue("admin", now).unwrap();
        let other = AdminSessionSigner::new(b"other-secret".to_vec(), Duration::hours(24));
        assert!(other.verify(&token, now).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let signer = signer();
        let now = Utc::now();
        for token in ["", "a.b", "a.b.c.d", "!!.??.%%"] {
            assert!(signer.verify(token, now).is_err(), "accepted {:?}", token);
        }
    }

    #[test]
    fn test_validate_credentials() {
        let config = admin_config();
        assert!(validate_credentials(&config, "admin", "s3cret"));
        assert!(!validate_credentials(&config, "admin", "s3cre"));
        assert!(!validate_credentials(&config, "Admin", "s3cret"));
        assert!(!validate_credentials(&config, "", ""));
    }

    #[actix_web::test]
    async fn test_extractor_requires_cookie() {
        use actix_web::cookie::Cookie;
        use actix_web::test::TestRequest;

        let signer = web::Data::new(signer());
        let token = signer.issue("admin", Utc::now()).unwrap();

        let req = TestRequest::default().app_data(signer.clone()).to_http_request();
        let err = AdminSession::extract(&req).unwrap_err();
        assert_eq!(err.http_status_code(), 401);

        let req = TestRequest::default()
            .app_data(signer.clone())
            .cookie(Cookie::new(ADMIN_SESSION_COOKIE, token))
            .to_http_request();
        let session = AdminSession::extract(&req).unwrap();
        assert_eq!(session.username(), "admin");
    }
}
