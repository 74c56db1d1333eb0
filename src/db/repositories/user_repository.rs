use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use sqlx::types::Uuid;
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};

use crate::db::error::DatabaseError;
use crate::db::models::{NewUser, Session, User, UserRole};

type HmacSha256 = Hmac<Sha256>;

/// Salted HMAC-SHA256 digest, stored as `salt$digest` (both hex).
fn hash_password(password: &str) -> String {
    use rand::RngCore;
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    let mut mac = HmacSha256::new_from_slice(salt_hex.as_bytes()).expect("HMAC key");
    mac.update(password.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("{salt_hex}${digest}")
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(salt_hex.as_bytes()) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &SqlitePool, data: &NewUser) -> Result<User, DatabaseError> {
        let now = OffsetDateTime::now_utc();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (id, email, password_hash, first_name, last_name, role,
                 specialization, availability, department, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.email.to_lowercase())
        .bind(hash_password(data.password.expose_secret()))
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.role)
        .bind(&data.specialization)
        .bind(&data.availability)
        .bind(&data.department)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(pool)
            .await?;
        Ok(users)
    }

    pub async fn list_by_role(
        pool: &SqlitePool,
        role: UserRole,
    ) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = ? ORDER BY last_name, first_name",
        )
        .bind(role)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    /// Email/password check. Returns the user only on a full match; a wrong
    /// password and an unknown email are indistinguishable to the caller.
    pub async fn verify_credentials(
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let Some(user) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn create_session(
        pool: &SqlitePool,
        user_id: Uuid,
        ttl_hours: u64,
    ) -> Result<Session, DatabaseError> {
        let now = OffsetDateTime::now_utc();
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(now)
        .bind(now + Duration::hours(ttl_hours as i64))
        .fetch_one(pool)
        .await?;
        Ok(session)
    }

    /// Resolves a session token to its user, ignoring expired sessions.
    pub async fn find_user_by_session(
        pool: &SqlitePool,
        token: Uuid,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            INNER JOIN sessions s ON s.user_id = u.id
            WHERE s.token = ? AND s.expires_at > ?
            "#,
        )
        .bind(token)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Logout is idempotent; deleting an unknown token is not an error.
    pub async fn delete_session(pool: &SqlitePool, token: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }
}
