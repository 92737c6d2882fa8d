use crate::forms::schema::SignUpCredentials;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account review state. Only approved users may borrow.
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

#[non_exhaustive]
#[derive(Serialize, Debug, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub university_id: i64,
    pub university_card: String,
    pub status: UserStatus,
    pub role: UserRole,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Account data of a sign-up, before it has an id
#[non_exhaustive]
#[derive(Serialize, Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub university_id: i64,
    pub university_card: String,
}

impl NewUser {
    #[must_use]
    #[inline]
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        university_id: i64,
        university_card: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            university_id,
            university_card: university_card.into(),
        }
    }
}

impl From<SignUpCredentials> for NewUser {
    #[inline]
    fn from(credentials: SignUpCredentials) -> Self {
        Self {
            full_name: credentials.full_name,
            email: credentials.email,
            university_id: credentials.university_id,
            university_card: credentials.university_card,
        }
    }
}

#[non_exhaustive]
#[derive(Serialize, Debug, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub rating: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub description: String,
    pub cover_color: String,
    pub cover_url: String,
    pub video_url: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[non_exhaustive]
#[derive(Serialize, Debug, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("user already exists (email={0})")]
    UserAlreadyExists(String),

    #[error("loan was already returned (id={0})")]
    AlreadyReturned(Uuid),

    #[error("cannot reduce total copies to {requested}, {on_loan} copies are on loan")]
    CopiesOnLoan { requested: i64, on_loan: i64 },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}
