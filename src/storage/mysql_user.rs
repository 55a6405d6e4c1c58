use async_trait::async_trait;

use crate::models::User;
use crate::storage::mysql::{millis_to_datetime, MySqlStorage};
use crate::storage::{Result, StorageError, UserStore};

const USER_COLUMNS: &str = "id, registration_number, registration_form_title, title, name, \
    father_husband_name, mobile_no, email_id, date_of_birth, passout_percentage, state, address, \
    course_name, experience, college_name, photo_url, qr_code_url, hashed_password, \
    created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    registration_number: String,
    registration_form_title: String,
    title: String,
    name: String,
    father_husband_name: String,
    mobile_no: String,
    email_id: String,
    date_of_birth: String,
    passout_percentage: f64,
    state: String,
    address: String,
    course_name: String,
    experience: String,
    college_name: String,
    photo_url: String,
    qr_code_url: Option<String>,
    hashed_password: String,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            registration_number: row.registration_number,
            registration_form_title: row.registration_form_title,
            title: row.title,
            name: row.name,
            father_husband_name: row.father_husband_name,
            mobile_no: row.mobile_no,
            email_id: row.email_id,
            date_of_birth: row.date_of_birth,
            passout_percentage: row.passout_percentage,
            state: row.state,
            address: row.address,
            course_name: row.course_name,
            experience: row.experience,
            college_name: row.college_name,
            photo_url: row.photo_url,
            qr_code_url: row.qr_code_url,
            hashed_password: row.hashed_password,
            created_at: millis_to_datetime(row.created_at)?,
            updated_at: millis_to_datetime(row.updated_at)?,
            deleted_at: row.deleted_at.map(millis_to_datetime).transpose()?,
        })
    }
}

impl MySqlStorage {
    async fn fetch_one_user(&self, filter: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, filter);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(self.get_sqlx_pool())
            .await
            .map_err(StorageError::from)?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for MySqlStorage {
    async fn create_user(&self, user: &User) -> Result<()> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            USER_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&user.id)
            .bind(&user.registration_number)
            .bind(&user.registration_form_title)
            .bind(&user.title)
            .bind(&user.name)
            .bind(&user.father_husband_name)
            .bind(&user.mobile_no)
            .bind(&user.email_id)
            .bind(&user.date_of_birth)
            .bind(user.passout_percentage)
            .bind(&user.state)
            .bind(&user.address)
            .bind(&user.course_name)
            .bind(&user.experience)
            .bind(&user.college_name)
            .bind(&user.photo_url)
            .bind(&user.qr_code_url)
            .bind(&user.hashed_password)
            .bind(user.created_at.timestamp_millis())
            .bind(user.updated_at.timestamp_millis())
            .bind(user.deleted_at.map(|t| t.timestamp_millis()))
            .execute(self.get_sqlx_pool())
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.fetch_one_user("id", id).await
    }

    async fn get_user_by_registration_number(&self, registration_number: &str) -> Result<Option<User>> {
        self.fetch_one_user("registration_number", registration_number).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_user("email_id", email).await
    }

    async fn find_user_by_email_or_mobile(&self, email: &str, mobile_no: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email_id = ? OR mobile_no = ? LIMIT 1",
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .bind(mobile_no)
            .fetch_optional(self.get_sqlx_pool())
            .await
            .map_err(StorageError::from)?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY created_at DESC",
            USER_COLUMNS
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .fetch_all(self.get_sqlx_pool())
            .await
            .map_err(StorageError::from)?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE users SET
                registration_form_title = ?, title = ?, name = ?, father_husband_name = ?,
                mobile_no = ?, email_id = ?, date_of_birth = ?, passout_percentage = ?,
                state = ?, address = ?, course_name = ?, experience = ?, college_name = ?,
                photo_url = ?, qr_code_url = ?, hashed_password = ?, updated_at = ?
              WHERE id = ?"#,
        )
        .bind(&user.registration_form_title)
        .bind(&user.title)
        .bind(&user.name)
        .bind(&user.father_husband_name)
        .bind(&user.mobile_no)
        .bind(&user.email_id)
        .bind(&user.date_of_birth)
        .bind(user.passout_percentage)
        .bind(&user.state)
        .bind(&user.address)
        .bind(&user.course_name)
        .bind(&user.experience)
        .bind(&user.college_name)
        .bind(&user.photo_url)
        .bind(&user.qr_code_url)
        .bind(&user.hashed_password)
        .bind(user.updated_at.timestamp_millis())
        .bind(&user.id)
        .execute(self.get_sqlx_pool())
        .await
        .map_err(StorageError::from)?;

        // An unchanged row also reports zero; callers load the row before updating.
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.get_sqlx_pool())
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
