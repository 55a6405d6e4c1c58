pub mod access_link;
pub mod user;

pub use access_link::AccessLink;
pub use user::{User, UserProfile, INDIAN_STATES};
