// Common test helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use certlink_server::config::settings::Config;
use certlink_server::server::app_state::AppState;
use certlink_server::storage::memory::MemoryStorage;
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.admin.username = ADMIN_USERNAME.to_string();
    config.admin.password = ADMIN_PASSWORD.to_string();
    config.admin.session_secret = Some("integration-test-secret".to_string());
    config.server.public_base_url = "https://certs.example.org".to_string();
    config
}

pub fn app_state_with_memory() -> AppState {
    AppState::new(test_config(), Arc::new(MemoryStorage::new()))
}

pub fn register_body(email: &str, mobile: &str) -> Value {
    json!({
        "registrationFormTitle": "Nursing Council Registration",
        "title": "Ms",
        "name": "Asha Verma",
        "fatherHusbandName": "R. Verma",
        "mobileNo": mobile,
        "emailId": email,
        "dateOfBirth": "1998-04-12",
        "passoutPercentage": 82.5,
        "state": "Kerala",
        "address": "12 MG Road, Kochi",
        "courseName": "GNM",
        "experience": "2 years",
        "collegeName": "Govt. College of Nursing",
        "photoUrl": "https://cdn.example.org/photos/asha.jpg"
    })
}

/// Last path segment of a public profile URL.
pub fn token_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or_default().to_string()
}

/// Initialized actix service with the full route table.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(certlink_server::server::http::configure_app_data($state))
                .configure(certlink_server::server::http::configure_routes),
        )
    };
}
