//! Credential-store database queries.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{FederatedIdentity, User, UserWithPassword};

const USER_COLUMNS: &str = "id, email, nickname, profile_url, birthday, pair_code, \
     auth_provider, subject, password_hash";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    nickname: String,
    profile_url: Option<String>,
    birthday: Option<NaiveDate>,
    pair_code: String,
    auth_provider: Option<String>,
    subject: Option<String>,
    password_hash: Option<String>,
}

impl UserRow {
    fn into_user_with_password(self) -> UserWithPassword {
        UserWithPassword {
            user: User {
                id: self.id,
                email: self.email,
                nickname: self.nickname,
                profile_url: self.profile_url,
                birthday: self.birthday,
                pair_code: self.pair_code,
                auth_provider: self.auth_provider,
                subject: self.subject,
            },
            password_hash: self.password_hash,
        }
    }

    fn into_user(self) -> User {
        self.into_user_with_password().user
    }
}

/// Fetch a user (with password hash) by email.
pub async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(UserRow::into_user_with_password))
}

/// Fetch a user by id.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(UserRow::into_user))
}

/// Fetch a user by federation subject.
pub async fn find_by_subject(pool: &PgPool, subject: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE subject = $1"
    ))
    .bind(subject)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(UserRow::into_user))
}

/// Fetch a user by their public pair code.
pub async fn find_by_pair_code(pool: &PgPool, pair_code: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE pair_code = $1"
    ))
    .bind(pair_code)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(UserRow::into_user))
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Create a local-credential user.
pub async fn create_local(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    nickname: &str,
    pair_code: &str,
    profile_url: &str,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (email, password_hash, nickname, pair_code, profile_url) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(password_hash)
    .bind(nickname)
    .bind(pair_code)
    .bind(profile_url)
    .fetch_one(pool)
    .await?;
    Ok(row.into_user())
}

/// Create a user from a federation identity (no local credential).
pub async fn create_federated(
    pool: &PgPool,
    identity: &FederatedIdentity,
    pair_code: &str,
    profile_url: &str,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (email, nickname, pair_code, profile_url, auth_provider, subject) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
    ))
    .bind(&identity.email)
    .bind(&identity.nickname)
    .bind(pair_code)
    .bind(profile_url)
    .bind(identity.provider.as_str())
    .bind(&identity.subject)
    .fetch_one(pool)
    .await?;
    Ok(row.into_user())
}

/// Update mutable profile fields; `None` leaves the column unchanged.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    nickname: Option<&str>,
    profile_url: Option<&str>,
    birthday: Option<NaiveDate>,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET \
            nickname = COALESCE($2, nickname), \
            profile_url = COALESCE($3, profile_url), \
            birthday = COALESCE($4, birthday) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(nickname)
    .bind(profile_url)
    .bind(birthday)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a user account. Notification rows cascade.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
