/// Admin account directory
///
/// Read-mostly access to the admins/roles/permissions tables, password
/// hashing, and the privileged create-admin flow. Passwords are hashed only
/// through the explicit `hash_password` step; nothing rehashes on save.
use crate::{
    admin::permissions::PROTECTED_ROLES,
    error::{AdminError, AdminResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor, SqlitePool};

/// Admin account record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: i64,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    #[serde(skip_serializing)]
    pub mfa_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Hash a plaintext password with Argon2id
pub fn hash_password(plain: &str) -> AdminResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AdminError::Internal(format!("Password hashing failed: {}", e)))
}

/// Constant-time verification of a plaintext against a stored hash
pub fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct AdminDirectory {
    db: SqlitePool,
}

impl AdminDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Exact, case-sensitive email lookup
    pub async fn find_by_email(&self, email: &str) -> AdminResult<Option<Admin>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, role_id, is_active,
                    last_login_at, last_login_ip, mfa_secret, created_at
             FROM admins WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(parse_admin))
    }

    pub async fn find_by_id(&self, id: i64) -> AdminResult<Option<Admin>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, role_id, is_active,
                    last_login_at, last_login_ip, mfa_secret, created_at
             FROM admins WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(parse_admin))
    }

    /// Name of a role, if the row still exists
    pub async fn role_name(&self, role_id: i64) -> AdminResult<Option<String>> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM roles WHERE id = ?1")
            .bind(role_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(name)
    }

    /// Flattened permission codes granted to a role
    pub async fn permission_codes(&self, role_id: i64) -> AdminResult<Vec<String>> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT p.code
             FROM permissions p
             JOIN role_permissions rp ON rp.permission_id = p.id
             WHERE rp.role_id = ?1
             ORDER BY p.code",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(codes)
    }

    pub async fn find_role_by_name(&self, name: &str) -> AdminResult<Option<RoleInfo>> {
        let row = sqlx::query("SELECT id, name, description FROM roles WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|row| RoleInfo {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
        }))
    }

    pub async fn list_roles(&self) -> AdminResult<Vec<RoleInfo>> {
        let rows = sqlx::query("SELECT id, name, description FROM roles ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RoleInfo {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
            })
            .collect())
    }

    /// Delete a role from the catalog. Super Admin and Admin are protected.
    pub async fn delete_role(&self, role_id: i64) -> AdminResult<()> {
        let name = self
            .role_name(role_id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("role {} not found", role_id)))?;

        if PROTECTED_ROLES.contains(&name.as_str()) {
            return Err(AdminError::Conflict(format!(
                "role {} is protected and cannot be deleted",
                name
            )));
        }

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE role_id = ?1")
            .bind(role_id)
            .fetch_one(&self.db)
            .await?;
        if in_use > 0 {
            return Err(AdminError::Conflict(format!(
                "role {} is still assigned to {} admin(s)",
                name, in_use
            )));
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?1")
            .bind(role_id)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM roles WHERE id = ?1")
            .bind(role_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Create an admin account. Privileged; the caller has already passed the
    /// permission check.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role_id: i64,
    ) -> AdminResult<Admin> {
        if username.is_empty() {
            return Err(AdminError::Validation("Username cannot be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(AdminError::Validation("Invalid email format".to_string()));
        }
        if password.len() < 8 {
            return Err(AdminError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.role_name(role_id).await?.is_none() {
            return Err(AdminError::Validation(format!("Role {} does not exist", role_id)));
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Err(AdminError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO admins (username, email, password_hash, role_id, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(role_id)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(Admin {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role_id,
            is_active: true,
            last_login_at: None,
            last_login_ip: None,
            mfa_secret: None,
            created_at: now,
        })
    }

    /// Toggle the active flag. Accounts are deactivated, never deleted.
    pub async fn set_active(&self, admin_id: i64, active: bool) -> AdminResult<()> {
        let result = sqlx::query("UPDATE admins SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(admin_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AdminError::NotFound(format!("admin {} not found", admin_id)));
        }

        Ok(())
    }

    /// Stamp last-login metadata; runs inside the login transaction
    pub async fn record_login<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        admin_id: i64,
        ip: Option<&str>,
    ) -> AdminResult<()> {
        sqlx::query("UPDATE admins SET last_login_at = ?1, last_login_ip = ?2 WHERE id = ?3")
            .bind(Utc::now())
            .bind(ip)
            .bind(admin_id)
            .execute(exec)
            .await?;

        Ok(())
    }
}

fn parse_admin(row: sqlx::sqlite::SqliteRow) -> Admin {
    Admin {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role_id: row.get("role_id"),
        is_active: row.get("is_active"),
        last_login_at: row.get("last_login_at"),
        last_login_ip: row.get("last_login_ip"),
        mfa_secret: row.get("mfa_secret"),
        created_at: row.get("created_at"),
    }
}
