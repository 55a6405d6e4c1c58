// Module declarations
pub mod notifier;
pub mod registration_service;

// Public re-exports
pub use notifier::{LogNotifier, RegistrationNotice, RegistrationNotifier};
pub use registration_service::{IssuedLink, RegisteredUser, RegistrationService};
