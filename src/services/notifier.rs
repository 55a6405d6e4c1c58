use async_trait::async_trait;
use tracing::info;

use crate::auth::token;
use crate::error::Result;

/// What a newly registered user is told.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationNotice {
    pub name: String,
    pub email: String,
    pub mobile_no: String,
    pub registration_number: String,
    pub course_name: String,
    /// `{base}/user/{token}`
    pub profile_url: String,
}

impl RegistrationNotice {
    pub fn subject(&self) -> &'static str {
        "Registration Successful - Certificate System"
    }

    /// Plain text body of the registration message.
    pub fn body(&self) -> String {
        format!(
            "Dear {},\n\n\
             Your registration is complete.\n\n\
             Registration number: {}\n\
             Course: {}\n\
             Email: {}\n\
             Mobile: {}\n\n\
             View your certificate: {}\n\n\
             This link expires. Sign in with your email and mobile number to get a new one.\n",
            self.name, self.registration_number, self.course_name, self.email, self.mobile_no, self.profile_url
        )
    }
}

/// Delivery of registration messages.
#[async_trait]
pub trait RegistrationNotifier: Send + Sync {
    async fn notify_registered(&self, notice: &RegistrationNotice) -> Result<()>;
}

/// Records the message in the log instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl RegistrationNotifier for LogNotifier {
    async fn notify_registered(&self, notice: &RegistrationNotice) -> Result<()> {
        let link_token = notice.profile_url.rsplit('/').next().unwrap_or_default();
        info!(
            to = %notice.email,
            registration_number = %notice.registration_number,
            subject = notice.subject(),
            "Registration notice prepared (link {}…)",
            token::log_prefix(link_token)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> RegistrationNotice {
        RegistrationNotice {
            name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            mobile_no: "9876543210".to_string(),
            registration_number: "MOH202512345".to_string(),
            course_name: "GNM".to_string(),
            profile_url: "http://localhost:3000/user/abcdef123456".to_string(),
        }
    }

    #[test]
    fn test_body_carries_link_and_registration_number() {
        let body = notice().body();
        assert!(body.contains("http://localhost:3000/user/abcdef123456"));
        assert!(body.contains("MOH202512345"));
        assert!(body.starts_with("Dear Asha Verma"));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify_registered(&notice()).await.is_ok());
    }
}
