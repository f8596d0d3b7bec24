/// Credential verification and token issuance
///
/// Orchestrates login: checks the credential, mints the token pair, and
/// persists the session row, last-login stamp and audit entry in one
/// transaction before the tokens are handed back. A token is never usable
/// before its session row exists.
use crate::{
    admin::{
        accounts::{verify_password, Admin, AdminDirectory},
        audit::ActivityLog,
        sessions::{AdminSession, IssuedTokens, RotationOutcome, SessionLedger},
        ClientInfo,
    },
    error::{AdminError, AdminResult},
    token::TokenCodec,
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Successful login result
#[derive(Debug)]
pub struct LoginOutcome {
    pub tokens: IssuedTokens,
    pub admin: Admin,
    pub role_name: String,
    pub permissions: Vec<String>,
}

pub struct CredentialVerifier {
    db: SqlitePool,
    codec: Arc<TokenCodec>,
    admins: AdminDirectory,
    sessions: SessionLedger,
    audit: ActivityLog,
}

impl CredentialVerifier {
    pub fn new(
        db: SqlitePool,
        codec: Arc<TokenCodec>,
        admins: AdminDirectory,
        sessions: SessionLedger,
        audit: ActivityLog,
    ) -> Self {
        Self {
            db,
            codec,
            admins,
            sessions,
            audit,
        }
    }

    /// Verify credentials and issue a token pair.
    ///
    /// Unknown email and wrong password both come back as `AuthFailed`; the
    /// disabled state is only revealed once the password has proven account
    /// ownership.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AdminResult<LoginOutcome> {
        let admin = match self.admins.find_by_email(email).await? {
            Some(admin) => admin,
            None => {
                tracing::warn!("login rejected: unknown email");
                return Err(AdminError::AuthFailed);
            }
        };

        if !verify_password(password, &admin.password_hash) {
            tracing::warn!(admin_id = admin.id, "login rejected: bad password");
            return Err(AdminError::AuthFailed);
        }

        if !admin.is_active {
            tracing::warn!(admin_id = admin.id, "login rejected: account disabled");
            return Err(AdminError::AccountDisabled);
        }

        let role_name = self
            .admins
            .role_name(admin.role_id)
            .await?
            .ok_or(AdminError::NoRole)?;
        let permissions = self.admins.permission_codes(admin.role_id).await?;

        // One jti ties the access token, the refresh token and the ledger row
        // together
        let jti = Uuid::new_v4().to_string();
        let access_token = self.codec.sign_access(admin.id, &role_name, &jti)?;
        let refresh_token = self.codec.sign_refresh(admin.id, &role_name, &jti)?;
        let session = AdminSession::issue(
            admin.id,
            &refresh_token,
            &jti,
            client,
            Utc::now() + self.codec.refresh_ttl(),
        );

        let mut tx = self.db.begin().await?;
        self.sessions.insert_with(&mut *tx, &session).await?;
        self.admins
            .record_login(&mut *tx, admin.id, client.ip.as_deref())
            .await?;
        self.audit
            .append_with(&mut *tx, admin.id, "auth.login", None, None, client)
            .await?;
        tx.commit().await?;

        tracing::info!(admin_id = admin.id, role = %role_name, "admin logged in");

        Ok(LoginOutcome {
            tokens: IssuedTokens {
                access_token,
                refresh_token,
            },
            admin,
            role_name,
            permissions,
        })
    }

    /// Redeem a refresh token for a new pair
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> AdminResult<RotationOutcome> {
        let outcome = self
            .sessions
            .refresh(&self.codec, &self.admins, refresh_token, client)
            .await?;

        self.audit
            .append(outcome.admin_id, "auth.refresh", None, None, client)
            .await?;

        Ok(outcome)
    }

    /// Revoke the session bound to a refresh token. Always succeeds; a stale
    /// or unknown token simply has nothing left to revoke.
    pub async fn logout(&self, refresh_token: &str, client: &ClientInfo) -> AdminResult<()> {
        if let Some(admin_id) = self.sessions.revoke_by_token(refresh_token).await? {
            self.audit
                .append(admin_id, "auth.logout", None, None, client)
                .await?;
            tracing::info!(admin_id, "admin logged out");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_config,
        db::test_pool,
        token::{SCOPE_ACCESS, SCOPE_REFRESH},
    };

    struct Setup {
        db: SqlitePool,
        verifier: CredentialVerifier,
        admins: AdminDirectory,
        sessions: SessionLedger,
        audit: ActivityLog,
        codec: Arc<TokenCodec>,
        admin_id: i64,
    }

    async fn setup() -> Setup {
        let db = test_pool().await;
        let codec = Arc::new(TokenCodec::new(&test_config().auth));
        let admins = AdminDirectory::new(db.clone());
        let sessions = SessionLedger::new(db.clone());
        let audit = ActivityLog::new(db.clone());

        let role = admins.find_role_by_name("Moderator").await.unwrap().unwrap();
        let admin = admins
            .create_admin("mira", "mira@example.com", "correct-horse", role.id)
            .await
            .unwrap();

        let verifier = CredentialVerifier::new(
            db.clone(),
            codec.clone(),
            admins.clone(),
            sessions.clone(),
            audit.clone(),
        );

        Setup {
            db,
            verifier,
            admins,
            sessions,
            audit,
            codec,
            admin_id: admin.id,
        }
    }

    #[tokio::test]
    async fn test_login_issues_tokens_and_session() {
        let s = setup().await;
        let client = ClientInfo::new("203.0.113.7");

        let outcome = s
            .verifier
            .login("mira@example.com", "correct-horse", &client)
            .await
            .unwrap();

        assert_eq!(outcome.role_name, "Moderator");
        assert!(outcome.permissions.contains(&"reports:review".to_string()));

        // Both tokens decode to the admin and share one jti
        let access = s.codec.verify(&outcome.tokens.access_token, SCOPE_ACCESS).unwrap();
        let refresh = s
            .codec
            .verify(&outcome.tokens.refresh_token, SCOPE_REFRESH)
            .unwrap();
        assert_eq!(access.subject_id().unwrap(), s.admin_id);
        assert_eq!(access.jti, refresh.jti);

        // A live, unexpired session row is bound to the refresh token
        let session = s
            .sessions
            .find_active(&outcome.tokens.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert!(!session.revoked);
        assert!(session.expires_at > Utc::now());
        assert_eq!(session.access_jti, access.jti);

        // Last-login stamped and the login audited
        let admin = s.admins.find_by_id(s.admin_id).await.unwrap().unwrap();
        assert!(admin.last_login_at.is_some());
        assert_eq!(admin.last_login_ip.as_deref(), Some("203.0.113.7"));

        let entries = s.audit.recent(5).await.unwrap();
        assert_eq!(entries[0].action, "auth.login");
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_no_trace() {
        let s = setup().await;

        let result = s
            .verifier
            .login("mira@example.com", "wrong-password", &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AdminError::AuthFailed)));

        // No session row was created
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_sessions")
            .fetch_one(&s.db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unknown_email_matches_wrong_password() {
        let s = setup().await;

        let unknown = s
            .verifier
            .login("nobody@example.com", "whatever-pass", &ClientInfo::default())
            .await;
        assert!(matches!(unknown, Err(AdminError::AuthFailed)));
    }

    #[tokio::test]
    async fn test_disabled_account_with_correct_password() {
        let s = setup().await;
        s.admins.set_active(s.admin_id, false).await.unwrap();

        // The right password reveals the disabled state...
        let result = s
            .verifier
            .login("mira@example.com", "correct-horse", &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AdminError::AccountDisabled)));

        // ...the wrong one does not
        let result = s
            .verifier
            .login("mira@example.com", "wrong-password", &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AdminError::AuthFailed)));
    }

    #[tokio::test]
    async fn test_login_then_refresh_then_logout() {
        let s = setup().await;
        let client = ClientInfo::default();

        let login = s
            .verifier
            .login("mira@example.com", "correct-horse", &client)
            .await
            .unwrap();

        let rotated = s
            .verifier
            .refresh(&login.tokens.refresh_token, &client)
            .await
            .unwrap();
        assert_eq!(rotated.admin_id, s.admin_id);

        // The original refresh token was spent by the rotation
        assert!(matches!(
            s.verifier.refresh(&login.tokens.refresh_token, &client).await,
            Err(AdminError::InvalidSession)
        ));

        s.verifier
            .logout(&rotated.tokens.refresh_token, &client)
            .await
            .unwrap();
        assert!(matches!(
            s.verifier.refresh(&rotated.tokens.refresh_token, &client).await,
            Err(AdminError::InvalidSession)
        ));

        // Logout of an unknown token still succeeds
        s.verifier.logout("gone-token", &client).await.unwrap();
    }
}
