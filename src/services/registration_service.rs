use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{password, token, AccessGate, LinkState};
use crate::config::constants::{MAX_REGISTRATION_NUMBER_ATTEMPTS, REGISTRATION_NUMBER_PREFIX};
use crate::config::settings::{AccessConfig, ServerConfig};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{User, UserProfile};
use crate::services::notifier::{RegistrationNotice, RegistrationNotifier};
use crate::storage::Storage;
use crate::validation::{
    validate_uuid, GenerateLinkRequest, RegisterUserRequest, UpdateUserRequest, UserLoginRequest,
};

const INVALID_LOGIN: &str = "Invalid email or phone number";
const PROFILE_UNAVAILABLE: &str = "Profile not found or link expired";

/// A freshly issued access link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLink {
    pub token: String,
    pub public_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user: UserProfile,
    pub link: IssuedLink,
}

/// User registration, administration and profile access.
pub struct RegistrationService {
    storage: Arc<dyn Storage>,
    gate: AccessGate,
    notifier: Arc<dyn RegistrationNotifier>,
    server: ServerConfig,
    access: AccessConfig,
}

impl RegistrationService {
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<dyn RegistrationNotifier>, config: &Config) -> Self {
        Self {
            gate: AccessGate::new(storage.clone()),
            storage,
            notifier,
            server: config.server.clone(),
            access: config.access.clone(),
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    async fn issue_link(&self, registration_number: &str, ttl: Duration) -> Result<IssuedLink> {
        let now = Utc::now();
        let token = self.gate.issue_at(registration_number, ttl, now).await?;
        Ok(IssuedLink {
            public_url: self.server.profile_url(&token),
            token,
            expires_at: now + ttl,
        })
    }

    /// Register a user and send them an administrator-lifetime link.
    #[instrument(skip(self, request), fields(email = %request.email_id))]
    pub async fn register_user(&self, request: RegisterUserRequest) -> Result<RegisteredUser> {
        request.validate()?;

        let email = request.email_id.trim().to_lowercase();
        let mobile_no = request.mobile_no.trim().to_string();

        if self
            .storage
            .find_user_by_email_or_mobile(&email, &mobile_no)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let registration_number = self.allocate_registration_number().await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            registration_number: registration_number.clone(),
            registration_form_title: request.registration_form_title.trim().to_string(),
            title: request.title.trim().to_string(),
            name: request.name.trim().to_string(),
            father_husband_name: request.father_husband_name.trim().to_string(),
            hashed_password: password::hash_password(&mobile_no),
            mobile_no,
            email_id: email,
            date_of_birth: request.date_of_birth.trim().to_string(),
            passout_percentage: request.passout_percentage,
            state: request.state.trim().to_string(),
            address: request.address.trim().to_string(),
            course_name: request.course_name.trim().to_string(),
            experience: request.experience.trim().to_string(),
            college_name: request.college_name.trim().to_string(),
            photo_url: request.photo_url.trim().to_string(),
            qr_code_url: request.qr_code_url(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.storage.create_user(&user).await?;
        info!("Registered user {} as {}", user.id, registration_number);

        let link = self.issue_link(&registration_number, self.access.admin_link_ttl()).await?;

        let notice = RegistrationNotice {
            name: user.name.clone(),
            email: user.email_id.clone(),
            mobile_no: user.mobile_no.clone(),
            registration_number,
            course_name: user.course_name.clone(),
            profile_url: link.public_url.clone(),
        };
        if let Err(e) = self.notifier.notify_registered(&notice).await {
            warn!("Registration notice for {} failed: {}", user.id, e);
        }

        Ok(RegisteredUser {
            user: UserProfile::from(user),
            link,
        })
    }

    /// `MOH{year}{5 digits}`, retried until unused.
    async fn allocate_registration_number(&self) -> Result<String> {
        let year = Utc::now().year();
        for _ in 0..MAX_REGISTRATION_NUMBER_ATTEMPTS {
            let candidate = candidate_registration_number(year);
            if self
                .storage
                .get_user_by_registration_number(&candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
            debug!("Registration number {} taken, retrying", candidate);
        }
        Err(AppError::internal("Could not allocate a registration number"))
    }

    /// Active users, newest first.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let users = self.storage.list_users().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    /// Apply the fields present in `request`.
    #[instrument(skip(self, request))]
    pub async fn update_user(&self, id: &str, request: UpdateUserRequest) -> Result<UserProfile> {
        if !validate_uuid(id) {
            return Err(AppError::validation("Invalid user ID format"));
        }
        request.validate()?;

        let mut user = self
            .storage
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        fn set(target: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *target = value.trim().to_string();
            }
        }

        set(&mut user.registration_form_title, request.registration_form_title);
        set(&mut user.title, request.title);
        set(&mut user.name, request.name);
        set(&mut user.father_husband_name, request.father_husband_name);
        set(&mut user.date_of_birth, request.date_of_birth);
        set(&mut user.state, request.state);
        set(&mut user.address, request.address);
        set(&mut user.course_name, request.course_name);
        set(&mut user.experience, request.experience);
        set(&mut user.college_name, request.college_name);
        set(&mut user.photo_url, request.photo_url);

        if let Some(email) = request.email_id {
            user.email_id = email.trim().to_lowercase();
        }
        if let Some(mobile_no) = request.mobile_no {
            let mobile_no = mobile_no.trim().to_string();
            if mobile_no != user.mobile_no {
                // the mobile number is the login secret
                user.hashed_password = password::hash_password(&mobile_no);
                user.mobile_no = mobile_no;
            }
        }
        if let Some(pct) = request.passout_percentage {
            user.passout_percentage = pct;
        }
        if let Some(url) = request.qr_code_url {
            let url = url.trim();
            user.qr_code_url = (!url.is_empty()).then(|| url.to_string());
        }
        user.updated_at = Utc::now();

        if !self.storage.update_user(&user).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!("Updated user {}", user.id);
        Ok(UserProfile::from(user))
    }

    /// Remove the user row. Access links stay in the ledger and stop resolving.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        if !validate_uuid(id) {
            return Err(AppError::validation("Invalid user ID format"));
        }
        if !self.storage.delete_user(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    /// Administrator-issued link for an existing user.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn generate_link(&self, request: GenerateLinkRequest) -> Result<IssuedLink> {
        request.validate()?;
        if !validate_uuid(&request.user_id) {
            return Err(AppError::validation("Invalid user ID format"));
        }

        let user = self
            .storage
            .get_user_by_id(&request.user_id)
            .await?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.issue_link(&user.registration_number, self.access.admin_link_ttl())
            .await
    }

    /// Email plus phone number login; returns a short-lived link.
    #[instrument(skip(self, request))]
    pub async fn user_login(&self, request: UserLoginRequest) -> Result<IssuedLink> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let user = match self.storage.get_user_by_email(&email).await? {
            Some(user) if user.deleted_at.is_none() => user,
            _ => {
                debug!("Login for unknown email");
                return Err(AppError::auth(INVALID_LOGIN));
            }
        };

        if !password::verify_password(request.phone_number.trim(), &user.hashed_password) {
            debug!("Phone number mismatch for user {}", user.id);
            return Err(AppError::auth(INVALID_LOGIN));
        }

        let link = self
            .issue_link(&user.registration_number, self.access.self_link_ttl())
            .await?;
        info!("User {} signed in", user.id);
        Ok(link)
    }

    /// Invalidate the link for good.
    pub async fn user_logout(&self, token: &str) -> Result<()> {
        if !self.gate.invalidate(token).await? {
            return Err(AppError::not_found("Invalid or unknown token"));
        }
        Ok(())
    }

    /// Profile behind a view token.
    #[instrument(skip(self, view_token), fields(token = %token::log_prefix(view_token)))]
    pub async fn view_profile(&self, view_token: &str) -> Result<UserProfile> {
        let registration_number = match self.gate.inspect(view_token).await? {
            LinkState::Valid(registration_number) => registration_number,
            LinkState::NotFound if self.access.legacy_fallback => match token::decode_legacy(view_token) {
                Some(registration_number) => {
                    debug!("Resolved legacy token for {}", registration_number);
                    registration_number
                }
                None => return Err(AppError::not_found(PROFILE_UNAVAILABLE)),
            },
            state => {
                debug!("Profile refused: {:?}", state);
                return Err(AppError::not_found(PROFILE_UNAVAILABLE));
            }
        };

        match self
            .storage
            .get_user_by_registration_number(&registration_number)
            .await?
        {
            Some(user) if user.deleted_at.is_none() => Ok(UserProfile::from(user)),
            _ => Err(AppError::not_found(PROFILE_UNAVAILABLE)),
        }
    }
}

fn candidate_registration_number(year: i32) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(10000..=99999);
    format!("{}{}{}", REGISTRATION_NUMBER_PREFIX, year, suffix)
}
