use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Row id (UUID v4), never shown on the certificate
    pub id: String,
    /// Durable registration number, e.g. `MOH202512345`
    pub registration_number: String,
    pub registration_form_title: String,
    pub title: String,
    pub name: String,
    pub father_husband_name: String,
    pub mobile_no: String,
    /// Stored lowercase
    pub email_id: String,
    pub date_of_birth: String,
    pub passout_percentage: f64,
    pub state: String,
    pub address: String,
    pub course_name: String,
    pub experience: String,
    pub college_name: String,
    pub photo_url: String,
    pub qr_code_url: Option<String>,
    /// `salt$sha256hex` of the mobile number
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Public projection of a user, without the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub registration_number: String,
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
    pub qr_code_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            registration_number: user.registration_number.clone(),
            registration_form_title: user.registration_form_title.clone(),
            title: user.title.clone(),
            name: user.name.clone(),
            father_husband_name: user.father_husband_name.clone(),
            mobile_no: user.mobile_no.clone(),
            email_id: user.email_id.clone(),
            date_of_birth: user.date_of_birth.clone(),
            passout_percentage: user.passout_percentage,
            state: user.state.clone(),
            address: user.address.clone(),
            course_name: user.course_name.clone(),
            experience: user.experience.clone(),
            college_name: user.college_name.clone(),
            photo_url: user.photo_url.clone(),
            qr_code_url: user.qr_code_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile::from(&user)
    }
}

/// States and union territories accepted on the registration form.
pub const INDIAN_STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

pub fn is_known_state(state: &str) -> bool {
    INDIAN_STATES.iter().any(|s| *s == state)
}
