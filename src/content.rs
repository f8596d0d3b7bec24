/// Moderated-entity directory
///
/// Thin data access over the platform's user/video/comment/sound tables.
/// The rest of the platform owns these entities; this service resolves report
/// targets, flips user status, and deletes reported content.
use crate::error::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor, SqlitePool};

/// Report target kinds. The tag selects which entity table to load/mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    User,
    Video,
    Comment,
    Sound,
}

impl ReportTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTarget::User => "user",
            ReportTarget::Video => "video",
            ReportTarget::Comment => "comment",
            ReportTarget::Sound => "sound",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s {
            "user" => Ok(ReportTarget::User),
            "video" => Ok(ReportTarget::Video),
            "comment" => Ok(ReportTarget::Comment),
            "sound" => Ok(ReportTarget::Sound),
            _ => Err(AdminError::Validation(format!(
                "Invalid report target type: {}",
                s
            ))),
        }
    }

    fn table(&self) -> &'static str {
        match self {
            ReportTarget::User => "users",
            ReportTarget::Video => "videos",
            ReportTarget::Comment => "comments",
            ReportTarget::Sound => "sounds",
        }
    }
}

/// End-user record, as far as this service needs it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// User status value written by a ban
pub const USER_STATUS_BANNED: &str = "banned";
/// User status required to pass the end-user gate
pub const USER_STATUS_ACTIVE: &str = "active";

#[derive(Clone)]
pub struct ContentDirectory {
    db: SqlitePool,
}

impl ContentDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_user(&self, id: i64) -> AdminResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, status, created_at FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            username: row.get("username"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        }))
    }

    /// Resolve the user who owns a report target.
    ///
    /// A user target is its own owner; for content targets the owning user id
    /// is read from the entity row.
    pub async fn owner_of<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        target: ReportTarget,
        target_id: i64,
    ) -> AdminResult<i64> {
        let sql = match target {
            ReportTarget::User => "SELECT id FROM users WHERE id = ?1".to_string(),
            other => format!("SELECT user_id FROM {} WHERE id = ?1", other.table()),
        };

        let owner: Option<i64> = sqlx::query_scalar(&sql)
            .bind(target_id)
            .fetch_optional(exec)
            .await?;

        owner.ok_or_else(|| {
            AdminError::NotFound(format!("{} {} not found", target.as_str(), target_id))
        })
    }

    /// Set a user's status to banned. Callers run this inside the resolution
    /// transaction.
    pub async fn ban_user<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        user_id: i64,
    ) -> AdminResult<()> {
        let result = sqlx::query("UPDATE users SET status = ?1 WHERE id = ?2")
            .bind(USER_STATUS_BANNED)
            .bind(user_id)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AdminError::NotFound(format!("user {} not found", user_id)));
        }

        Ok(())
    }

    /// Delete a reported content entity. Irreversible; runs outside the
    /// resolution transaction.
    pub async fn delete_content(&self, target: ReportTarget, target_id: i64) -> AdminResult<()> {
        if target == ReportTarget::User {
            return Err(AdminError::Validation(
                "user targets are banned, not deleted".to_string(),
            ));
        }

        let sql = format!("DELETE FROM {} WHERE id = ?1", target.table());
        let result = sqlx::query(&sql).bind(target_id).execute(&self.db).await?;

        if result.rows_affected() == 0 {
            return Err(AdminError::NotFound(format!(
                "{} {} not found",
                target.as_str(),
                target_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Insert a user row and return its id
    pub async fn seed_user(db: &SqlitePool, username: &str, status: &str) -> i64 {
        sqlx::query("INSERT INTO users (username, status, created_at) VALUES (?1, ?2, ?3)")
            .bind(username)
            .bind(status)
            .bind(Utc::now())
            .execute(db)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    /// Insert a video row owned by `user_id` and return its id
    pub async fn seed_video(db: &SqlitePool, user_id: i64, title: &str) -> i64 {
        sqlx::query("INSERT INTO videos (user_id, title, created_at) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(title)
            .bind(Utc::now())
            .execute(db)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    /// Insert a comment row owned by `user_id` and return its id
    pub async fn seed_comment(db: &SqlitePool, user_id: i64, body: &str) -> i64 {
        sqlx::query("INSERT INTO comments (user_id, body, created_at) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(body)
            .bind(Utc::now())
            .execute(db)
            .await
            .unwrap()
            .last_insert_rowid()
    }
}
