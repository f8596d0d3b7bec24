/// Authentication extractors
///
/// Per-request gates resolving a bearer token to an authenticated principal.
/// Admin and end-user principals are distinct types with distinct failure
/// domains; neither holds any shared mutable state.
use crate::{
    admin::{accounts::Admin, permissions::allow},
    api::middleware::extract_bearer_token,
    content::{User, USER_STATUS_ACTIVE},
    context::AppContext,
    error::{AdminError, AdminResult},
    token::SCOPE_ACCESS,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated admin principal with its resolved role and permission set
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub admin: Admin,
    pub role_name: String,
    pub permissions: Vec<String>,
}

impl AdminIdentity {
    /// Deny unless the principal holds any one of the required permissions.
    /// The error names the codes that would have satisfied the check and
    /// nothing about what the principal holds.
    pub fn require(&self, required: &[&str]) -> AdminResult<()> {
        if allow(&self.role_name, &self.permissions, required) {
            Ok(())
        } else {
            tracing::warn!(
                admin_id = self.admin.id,
                role = %self.role_name,
                ?required,
                "permission denied"
            );
            Err(AdminError::Forbidden {
                required: required.iter().map(|c| c.to_string()).collect(),
            })
        }
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminIdentity {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(AdminError::NoToken)?;

        let claims = state.codec.verify(&token, SCOPE_ACCESS)?;
        let admin_id = claims.subject_id()?;

        // The account state is authoritative on every request; a valid token
        // for a deactivated admin is worthless
        let admin = state
            .admins
            .find_by_id(admin_id)
            .await?
            .ok_or(AdminError::AccessDenied)?;
        if !admin.is_active {
            return Err(AdminError::AccessDenied);
        }

        let role_name = state
            .admins
            .role_name(admin.role_id)
            .await?
            .ok_or(AdminError::NoRole)?;
        let permissions = state.admins.permission_codes(admin.role_id).await?;

        Ok(AdminIdentity {
            admin,
            role_name,
            permissions,
        })
    }
}

/// Authenticated end-user principal, resolved against the users table
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppContext> for UserIdentity {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(AdminError::NoToken)?;

        let claims = state.codec.verify(&token, SCOPE_ACCESS)?;
        let user_id = claims.subject_id()?;

        let user = state
            .content
            .find_user(user_id)
            .await?
            .ok_or(AdminError::AccessDenied)?;
        if user.status != USER_STATUS_ACTIVE {
            return Err(AdminError::AccessDenied);
        }

        Ok(UserIdentity { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        admin::accounts::AdminDirectory,
        config::test_config,
        content::fixtures::seed_user,
        db::test_pool,
    };
    use axum::http::Request;

    async fn ctx() -> AppContext {
        AppContext::with_pool(test_config(), test_pool().await)
            .await
            .unwrap()
    }

    fn parts_with_bearer(token: &str) -> Parts {
        let req = Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(())
            .unwrap();
        req.into_parts().0
    }

    async fn seed_admin(ctx: &AppContext, role: &str, active: bool) -> Admin {
        let dir = AdminDirectory::new(ctx.db.clone());
        let role = dir.find_role_by_name(role).await.unwrap().unwrap();
        let admin = dir
            .create_admin("gatekeeper", "gate@example.com", "password-1", role.id)
            .await
            .unwrap();
        if !active {
            dir.set_active(admin.id, false).await.unwrap();
        }
        admin
    }

    #[tokio::test]
    async fn test_gate_resolves_principal() {
        let ctx = ctx().await;
        let admin = seed_admin(&ctx, "Moderator", true).await;
        let token = ctx.codec.sign_access(admin.id, "Moderator", "jti-1").unwrap();

        let mut parts = parts_with_bearer(&token);
        let identity = AdminIdentity::from_request_parts(&mut parts, &ctx)
            .await
            .unwrap();

        assert_eq!(identity.admin.id, admin.id);
        assert_eq!(identity.role_name, "Moderator");
        assert!(identity.permissions.contains(&"reports:review".to_string()));
    }

    #[tokio::test]
    async fn test_missing_token_is_no_token() {
        let ctx = ctx().await;
        let req = Request::builder().body(()).unwrap();
        let (mut parts, _) = req.into_parts();

        assert!(matches!(
            AdminIdentity::from_request_parts(&mut parts, &ctx).await,
            Err(AdminError::NoToken)
        ));
    }

    #[tokio::test]
    async fn test_valid_token_of_disabled_admin_is_rejected() {
        let ctx = ctx().await;
        let admin = seed_admin(&ctx, "Moderator", true).await;
        let token = ctx.codec.sign_access(admin.id, "Moderator", "jti-1").unwrap();

        // Token passes the gate while the account is active...
        let mut parts = parts_with_bearer(&token);
        assert!(AdminIdentity::from_request_parts(&mut parts, &ctx).await.is_ok());

        // ...and stops passing the moment it is deactivated, even though the
        // token itself is still cryptographically valid and unexpired
        AdminDirectory::new(ctx.db.clone())
            .set_active(admin.id, false)
            .await
            .unwrap();

        let mut parts = parts_with_bearer(&token);
        assert!(matches!(
            AdminIdentity::from_request_parts(&mut parts, &ctx).await,
            Err(AdminError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let ctx = ctx().await;
        let mut parts = parts_with_bearer("not-a-token");

        assert!(matches!(
            AdminIdentity::from_request_parts(&mut parts, &ctx).await,
            Err(AdminError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_require_names_missing_permissions() {
        let ctx = ctx().await;
        let admin = seed_admin(&ctx, "Analyst", true).await;
        let token = ctx.codec.sign_access(admin.id, "Analyst", "jti-1").unwrap();

        let mut parts = parts_with_bearer(&token);
        let identity = AdminIdentity::from_request_parts(&mut parts, &ctx)
            .await
            .unwrap();

        let err = identity.require(&["users:ban"]).unwrap_err();
        match err {
            AdminError::Forbidden { required } => {
                assert_eq!(required, vec!["users:ban".to_string()]);
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }

        // Any held code passes
        identity.require(&["analytics:view", "users:ban"]).unwrap();
    }

    #[tokio::test]
    async fn test_user_gate_checks_status() {
        let ctx = ctx().await;
        let active = seed_user(&ctx.db, "viewer", USER_STATUS_ACTIVE).await;
        let banned = seed_user(&ctx.db, "pariah", "banned").await;

        let token = ctx.codec.sign_access(active, "User", "jti-u1").unwrap();
        let mut parts = parts_with_bearer(&token);
        let identity = UserIdentity::from_request_parts(&mut parts, &ctx)
            .await
            .unwrap();
        assert_eq!(identity.user.id, active);

        let token = ctx.codec.sign_access(banned, "User", "jti-u2").unwrap();
        let mut parts = parts_with_bearer(&token);
        assert!(matches!(
            UserIdentity::from_request_parts(&mut parts, &ctx).await,
            Err(AdminError::AccessDenied)
        ));
    }
}
