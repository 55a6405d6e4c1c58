use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

use crate::models::{AccessLink, User};
use crate::storage::{AccessLinkStore, Result, Storage, StorageError, UserStore};

// In-memory storage data structure (using Mutex for thread safety)
#[derive(Default)]
struct StorageData {
    access_links: HashMap<String, AccessLink>, // token -> access_link
    users: HashMap<String, User>,              // id -> user
}

/// In-memory storage implementation (useful for testing)
#[derive(Default)]
pub struct MemoryStorage {
    data: TokioMutex<StorageData>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessLinkStore for MemoryStorage {
    async fn insert_access_link(&self, link: &AccessLink) -> Result<()> {
        let mut data = self.data.lock().await;
        if data.access_links.contains_key(&link.token) {
            return Err(StorageError::Duplicate("access_links.token".to_string()));
        }
        data.access_links.insert(link.token.clone(), link.clone());
        Ok(())
    }

    async fn find_access_link(&self, token: &str) -> Result<Option<AccessLink>> {
        let data = self.data.lock().await;
        Ok(data.access_links.get(token).cloned())
    }

    async fn mark_access_link_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let mut data = self.data.lock().await;
        match data.access_links.get_mut(token) {
            Some(link) => {
                link.is_used = true;
                link.used_at.get_or_insert(used_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut data = self.data.lock().await;
        let clash = data.users.values().find(|u| {
            u.id == user.id
                || u.email_id == user.email_id
                || u.mobile_no == user.mobile_no
                || u.registration_number == user.registration_number
        });
        if let Some(existing) = clash {
            debug!("Rejecting duplicate user, clashes with {}", existing.id);
            return Err(StorageError::Duplicate("users".to_string()));
        }
        data.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let data = self.data.lock().await;
        Ok(data.users.get(id).cloned())
    }

    async fn get_user_by_registration_number(&self, registration_number: &str) -> Result<Option<User>> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .values()
            .find(|u| u.registration_number == registration_number)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let data = self.data.lock().await;
        Ok(data.users.values().find(|u| u.email_id == email).cloned())
    }

    async fn find_user_by_email_or_mobile(&self, email: &str, mobile_no: &str) -> Result<Option<User>> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .values()
            .find(|u| u.email_id == email || u.mobile_no == mobile_no)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let data = self.data.lock().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let mut data = self.data.lock().await;
        let clash = data.users.values().any(|u| {
            u.id != user.id && (u.email_id == user.email_id || u.mobile_no == user.mobile_no)
        });
        if clash {
            return Err(StorageError::Duplicate("users".to_string()));
        }
        match data.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut data = self.data.lock().await;
        Ok(data.users.remove(id).is_some())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user(id: &str, email: &str, mobile: &str, reg: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            registration_number: reg.to_string(),
            registration_form_title: String::new(),
            title: "Ms".to_string(),
            name: "Asha Verma".to_string(),
            father_husband_name: "R. Verma".to_string(),
            mobile_no: mobile.to_string(),
            email_id: email.to_string(),
            date_of_birth: "1995-04-12".to_string(),
            passout_percentage: 78.5,
            state: "Kerala".to_string(),
            address: "12 Lake Road".to_string(),
            course_name: "Staff Nursing".to_string(),
            experience: "3 years".to_string(),
            college_name: "Govt. Nursing College".to_string(),
            photo_url: "https://cdn.example.org/p.jpg".to_string(),
            qr_code_url: None,
            hashed_password: "salt$hash".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_token_is_rejected_and_first_row_kept() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let first = AccessLink::issued("tok".into(), "MOH202500001".into(), now, Duration::hours(1));
        let second = AccessLink::issued("tok".into(), "MOH202500002".into(), now, Duration::hours(1));

        storage.insert_access_link(&first).await.unwrap();
        let err = storage.insert_access_link(&second).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));

        let stored = storage.find_access_link("tok").await.unwrap().unwrap();
        assert_eq!(stored.registration_number, "MOH202500001");
    }

    #[tokio::test]
    async fn test_token_lookup_is_case_sensitive() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let link = AccessLink::issued("AbCd".into(), "MOH202500001".into(), now, Duration::hours(1));
        storage.insert_access_link(&link).await.unwrap();

        assert!(storage.find_access_link("abcd").await.unwrap().is_none());
        assert!(!storage.mark_access_link_used("ABCD", now).await.unwrap());
        assert!(!storage.find_access_link("AbCd").await.unwrap().unwrap().is_used);
    }

    #[tokio::test]
    async fn test_mark_used_keeps_first_timestamp() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let link = AccessLink::issued("tok".into(), "MOH202500001".into(), now, Duration::hours(1));
        storage.insert_access_link(&link).await.unwrap();

        assert!(storage.mark_access_link_used("tok", now).await.unwrap());
        assert!(storage
            .mark_access_link_used("tok", now + Duration::minutes(5))
            .await
            .unwrap());
        assert!(!storage.mark_access_link_used("missing", now).await.unwrap());

        let stored = storage.find_access_link("tok").await.unwrap().unwrap();
        assert!(stored.is_used);
        assert_eq!(stored.used_at, Some(now));
    }

    #[tokio::test]
    async fn test_list_users_skips_deleted_and_orders_newest_first() {
        let storage = MemoryStorage::new();
        let mut older = sample_user("1", "a@example.org", "9000000001", "MOH202500001");
        older.created_at = Utc::now() - Duration::days(1);
        let newer = sample_user("2", "b@example.org", "9000000002", "MOH202500002");
        let mut deleted = sample_user("3", "c@example.org", "9000000003", "MOH202500003");
        deleted.deleted_at = Some(Utc::now());

        for user in [&older, &newer, &deleted] {
            storage.create_user(user).await.unwrap();
        }

        let ids: Vec<String> = storage.list_users().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["2".to_string(), "1".to_string()]);
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let storage = MemoryStorage::new();
        storage
            .create_user(&sample_user("1", "a@example.org", "9000000001", "MOH202500001"))
            .await
            .unwrap();
        let err = storage
            .create_user(&sample_user("2", "a@example.org", "9000000002", "MOH202500002"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
    }
}
