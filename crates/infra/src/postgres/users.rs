use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{Span, instrument};
use uuid::Uuid;

use carkeeper_auth::{NewUser, Role, User};
use carkeeper_core::UserId;

use super::{PostgresStore, corrupt, map_sqlx_error};
use crate::store::UserStore;
use crate::{StoreError, StoreResult};

const USER_COLUMNS: &str =
    "user_id, first_name, last_name, email, phone, password_hash, role, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_uuid(row.user_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role: row.role.parse::<Role>().map_err(|e| corrupt("users.role", e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (user_id, first_name, last_name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        row.try_into()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_id", e))?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self, email), fields(found), err)]
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_email", e))?;

        Span::current().record("found", row.is_some());
        row.map(User::try_from).transpose()
    }
}
