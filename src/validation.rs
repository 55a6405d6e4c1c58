//! Request bodies and input validation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::user::is_known_state;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "is required");
        }
    }

    /// `Err(AppError::Validation)` listing every failed field.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            return Ok(());
        }
        let message = self
            .errors
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation(message))
    }
}

/// Validates if a string is a valid UUID format
pub fn validate_uuid(uuid: &str) -> bool {
    uuid::Uuid::parse_str(uuid).is_ok()
}

pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// 10 to 15 digits with an optional leading `+`.
pub fn validate_mobile(mobile: &str) -> bool {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_date_of_birth(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

pub fn validate_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

/// Asset URLs are produced by the upload service and must be absolute http(s).
pub fn validate_asset_url(url: &str) -> bool {
    is_http_url(url)
}

/// Parses as an absolute URL with an http(s) scheme and a host.
pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().map_or(false, |h| !h.is_empty()))
        .unwrap_or(false)
}

/// Empty strings from the form mean "no value".
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Body of `POST /api/admin/register-user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub registration_form_title: String,
    pub title: String,
    pub name: String,
    pub father_husband_name: String,
    pub mobile_no: String,
    pub email_id: String,
    pub date_of_birth: String,
    pub passout_percentage: f64,
    pub state: String,
    pub address: String,
    pub course_name: String,
    pub experience: String,
    pub college_name: String,
    pub photo_url: String,
    #[serde(default)]
    pub qr_code_url: Option<String>,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();

        result.require("title", &self.title);
        result.require("name", &self.name);
        result.require("fatherHusbandName", &self.father_husband_name);
        result.require("address", &self.address);
        result.require("courseName", &self.course_name);
        result.require("experience", &self.experience);
        result.require("collegeName", &self.college_name);

        if !validate_mobile(self.mobile_no.trim()) {
            result.add_error("mobileNo", "must be 10 to 15 digits");
        }
        if !validate_email(&self.email_id) {
            result.add_error("emailId", "is not a valid email address");
        }
        if !validate_date_of_birth(self.date_of_birth.trim()) {
            result.add_error("dateOfBirth", "must be YYYY-MM-DD");
        }
        if !validate_percentage(self.passout_percentage) {
            result.add_error("passoutPercentage", "must be between 0 and 100");
        }
        if !is_known_state(self.state.trim()) {
            result.add_error("state", "is not a known state or union territory");
        }
        if !validate_asset_url(self.photo_url.trim()) {
            result.add_error("photoUrl", "must be an http(s) URL");
        }
        if let Some(url) = non_empty(&self.qr_code_url) {
            if !validate_asset_url(url) {
                result.add_error("qrCodeUrl", "must be an http(s) URL");
            }
        }

        result.into_result()
    }

    pub fn qr_code_url(&self) -> Option<String> {
        non_empty(&self.qr_code_url).map(str::to_string)
    }
}

/// Body of `PUT /api/admin/users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub registration_form_title: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub father_husband_name: Option<String>,
    pub mobile_no: Option<String>,
    pub email_id: Option<String>,
    pub date_of_birth: Option<String>,
    pub passout_percentage: Option<f64>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub course_name: Option<String>,
    pub experience: Option<String>,
    pub college_name: Option<String>,
    pub photo_url: Option<String>,
    pub qr_code_url: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();

        let required = [
            ("title", &self.title),
            ("name", &self.name),
            ("fatherHusbandName", &self.father_husband_name),
            ("address", &self.address),
            ("courseName", &self.course_name),
            ("experience", &self.experience),
            ("collegeName", &self.college_name),
        ];
        for (field, value) in required {
            if let Some(value) = value {
                result.require(field, value);
            }
        }

        if let Some(mobile) = &self.mobile_no {
            if !validate_mobile(mobile.trim()) {
                result.add_error("mobileNo", "must be 10 to 15 digits");
            }
        }
        if let Some(email) = &self.email_id {
            if !validate_email(email) {
                result.add_error("emailId", "is not a valid email address");
            }
        }
        if let Some(dob) = &self.date_of_birth {
            if !validate_date_of_birth(dob.trim()) {
                result.add_error("dateOfBirth", "must be YYYY-MM-DD");
            }
        }
        if let Some(pct) = self.passout_percentage {
            if !validate_percentage(pct) {
                result.add_error("passoutPercentage", "must be between 0 and 100");
            }
        }
        if let Some(state) = &self.state {
            if !is_known_state(state.trim()) {
                result.add_error("state", "is not a known state or union territory");
            }
        }
        if let Some(url) = &self.photo_url {
            if !validate_asset_url(url.trim()) {
                result.add_error("photoUrl", "must be an http(s) URL");
            }
        }
        if let Some(url) = non_empty(&self.qr_code_url) {
            if !validate_asset_url(url) {
                result.add_error("qrCodeUrl", "must be an http(s) URL");
            }
        }

        result.into_result()
    }
}

/// Body of `POST /api/admin/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for AdminLoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminLoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminLoginRequest {
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();
        result.require("username", &self.username);
        result.require("password", &self.password);
        result.into_result()
    }
}

/// Body of `POST /api/user/login`: email plus the phone number as password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
}

impl UserLoginRequest {
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();
        result.require("email", &self.email);
        result.require("phoneNumber", &self.phone_number);
        result.into_result()
    }
}

/// Body of `POST /api/user/logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub token: String,
}

impl LogoutRequest {
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();
        result.require("token", &self.token);
        result.into_result()
    }
}

/// Body of `POST /api/admin/generate-link`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinkRequest {
    #[serde(default)]
    pub user_id: String,
}

impl GenerateLinkRequest {
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();
        result.require("userId", &self.user_id);
        result.into_result()
    }
}
