/// Session ledger and refresh rotation
///
/// One row per issued refresh token. Rows move `active -> revoked` exactly
/// once; a redeemed refresh token is revoked inside the same transaction that
/// records its replacement, so each token value can be spent once even under
/// concurrent redemption.
use crate::{
    admin::{accounts::AdminDirectory, ClientInfo},
    error::{AdminError, AdminResult},
    token::{TokenCodec, SCOPE_REFRESH},
};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

/// Refresh-token record
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub id: String,
    pub admin_id: i64,
    pub refresh_token: String,
    pub access_jti: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    /// Build a fresh row for a newly issued token pair
    pub fn issue(
        admin_id: i64,
        refresh_token: &str,
        jti: &str,
        client: &ClientInfo,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            admin_id,
            refresh_token: refresh_token.to_string(),
            access_jti: jti.to_string(),
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }
}

/// Freshly minted token pair
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful rotation
#[derive(Debug)]
pub struct RotationOutcome {
    pub tokens: IssuedTokens,
    pub admin_id: i64,
    pub session_id: String,
}

#[derive(Clone)]
pub struct SessionLedger {
    db: SqlitePool,
}

impl SessionLedger {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a session row through the caller's executor
    pub async fn insert_with<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        session: &AdminSession,
    ) -> AdminResult<()> {
        sqlx::query(
            "INSERT INTO admin_sessions
                 (id, admin_id, refresh_token, access_jti, ip, user_agent,
                  expires_at, revoked, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&session.id)
        .bind(session.admin_id)
        .bind(&session.refresh_token)
        .bind(&session.access_jti)
        .bind(&session.ip)
        .bind(&session.user_agent)
        .bind(session.expires_at)
        .bind(session.revoked)
        .bind(session.created_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Locate the unrevoked row for a refresh-token value
    pub async fn find_active(&self, refresh_token: &str) -> AdminResult<Option<AdminSession>> {
        let row = sqlx::query(
            "SELECT id, admin_id, refresh_token, access_jti, ip, user_agent,
                    expires_at, revoked, created_at
             FROM admin_sessions
             WHERE refresh_token = ?1 AND revoked = 0",
        )
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(parse_session))
    }

    pub async fn find_by_id(&self, session_id: &str) -> AdminResult<Option<AdminSession>> {
        let row = sqlx::query(
            "SELECT id, admin_id, refresh_token, access_jti, ip, user_agent,
                    expires_at, revoked, created_at
             FROM admin_sessions
             WHERE id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(parse_session))
    }

    /// Revoke the session bound to a refresh token (logout). Returns the
    /// owning admin id when a live row was found; revoking an unknown or
    /// already-revoked token is not an error.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> AdminResult<Option<i64>> {
        let admin_id: Option<i64> = sqlx::query_scalar(
            "UPDATE admin_sessions SET revoked = 1
             WHERE refresh_token = ?1 AND revoked = 0
             RETURNING admin_id",
        )
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await?;

        Ok(admin_id)
    }

    /// Redeem a refresh token: verify it against both the ledger row and its
    /// signature, then rotate. The presented token's row is revoked and a
    /// replacement row created in one transaction; exactly one of two
    /// concurrent redemptions can win.
    pub async fn refresh(
        &self,
        codec: &TokenCodec,
        admins: &AdminDirectory,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> AdminResult<RotationOutcome> {
        let session = self
            .find_active(refresh_token)
            .await?
            .ok_or(AdminError::InvalidSession)?;

        // The row expiry is authoritative and revocable, independent of the
        // expiry embedded in the token itself
        if Utc::now() > session.expires_at {
            return Err(AdminError::SessionExpired);
        }

        codec.verify(refresh_token, SCOPE_REFRESH)?;

        let admin = admins
            .find_by_id(session.admin_id)
            .await?
            .ok_or(AdminError::InvalidSession)?;
        if !admin.is_active {
            return Err(AdminError::AccountDisabled);
        }
        let role_name = admins
            .role_name(admin.role_id)
            .await?
            .ok_or(AdminError::NoRole)?;

        let jti = Uuid::new_v4().to_string();
        let access_token = codec.sign_access(admin.id, &role_name, &jti)?;
        let new_refresh = codec.sign_refresh(admin.id, &role_name, &jti)?;
        let replacement = AdminSession::issue(
            admin.id,
            &new_refresh,
            &jti,
            client,
            Utc::now() + codec.refresh_ttl(),
        );

        let mut tx = self.db.begin().await?;

        // Check-and-set: the row may have been spent since we loaded it
        let revoked = sqlx::query(
            "UPDATE admin_sessions SET revoked = 1 WHERE id = ?1 AND revoked = 0",
        )
        .bind(&session.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if revoked == 0 {
            return Err(AdminError::InvalidSession);
        }

        self.insert_with(&mut *tx, &replacement).await?;
        tx.commit().await?;

        tracing::info!(
            admin_id = admin.id,
            session_id = %replacement.id,
            "refresh token rotated"
        );

        Ok(RotationOutcome {
            tokens: IssuedTokens {
                access_token,
                refresh_token: new_refresh,
            },
            admin_id: admin.id,
            session_id: replacement.id,
        })
    }
}

fn parse_session(row: sqlx::sqlite::SqliteRow) -> AdminSession {
    AdminSession {
        id: row.get("id"),
        admin_id: row.get("admin_id"),
        refresh_token: row.get("refresh_token"),
        access_jti: row.get("access_jti"),
        ip: row.get("ip"),
        user_agent: row.get("user_agent"),
        expires_at: row.get("expires_at"),
        revoked: row.get("revoked"),
        created_at: row.get("created_at"),
    }
}
