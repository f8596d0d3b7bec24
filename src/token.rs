/// Signed-token codec
///
/// Stateless signer/verifier for access and refresh tokens. An access token
/// and the refresh token issued alongside it share one jti, which the session
/// ledger records so the pair can be revoked together.
use crate::{
    config::AuthConfig,
    error::{AdminError, AdminResult},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Scope claim values
pub const SCOPE_ACCESS: &str = "access";
pub const SCOPE_REFRESH: &str = "refresh";

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: admin id
    pub sub: String,
    /// Role name at issuance time
    pub role: String,
    /// Unique token id shared by an access/refresh pair
    pub jti: String,
    /// "access" or "refresh"
    pub scope: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Parse the subject claim back into an admin id
    pub fn subject_id(&self) -> AdminResult<i64> {
        self.sub.parse().map_err(|_| AdminError::InvalidToken)
    }
}

/// Signs and verifies admin tokens. Pure function of secret + payload; no I/O.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            secret: auth.jwt_secret.clone(),
            issuer: auth.token_issuer.clone(),
            audience: auth.token_audience.clone(),
            access_ttl: Duration::hours(auth.access_ttl_hours),
            refresh_ttl: Duration::days(auth.refresh_ttl_days),
        }
    }

    /// Refresh token lifetime, also used for the session row expiry
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign an access token
    pub fn sign_access(&self, admin_id: i64, role: &str, jti: &str) -> AdminResult<String> {
        self.sign(admin_id, role, jti, SCOPE_ACCESS, self.access_ttl)
    }

    /// Sign a refresh token sharing the access token's jti
    pub fn sign_refresh(&self, admin_id: i64, role: &str, jti: &str) -> AdminResult<String> {
        self.sign(admin_id, role, jti, SCOPE_REFRESH, self.refresh_ttl)
    }

    fn sign(
        &self,
        admin_id: i64,
        role: &str,
        jti: &str,
        scope: &str,
        ttl: Duration,
    ) -> AdminResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin_id.to_string(),
            role: role.to_string(),
            jti: jti.to_string(),
            scope: scope.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AdminError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature, expiry, issuer, audience and scope.
    ///
    /// Every failure collapses to the opaque `InvalidToken` so callers cannot
    /// distinguish expired from tampered tokens.
    pub fn verify(&self, token: &str, expected_scope: &str) -> AdminResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = 30;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("token verification failed: {}", e);
            AdminError::InvalidToken
        })?;

        if data.claims.scope != expected_scope {
            return Err(AdminError::InvalidToken);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn codec() -> TokenCodec {
        TokenCodec::new(&test_config().auth)
    }

    #[test]
    fn test_sign_and_verify_access_token() {
        let codec = codec();
        let token = codec.sign_access(7, "Moderator", "jti-1").unwrap();

        let claims = codec.verify(&token, SCOPE_ACCESS).unwrap();
        assert_eq!(claims.subject_id().unwrap(), 7);
        assert_eq!(claims.role, "Moderator");
        assert_eq!(claims.jti, "jti-1");
        assert_eq!(claims.scope, SCOPE_ACCESS);
    }

    #[test]
    fn test_access_and_refresh_share_jti() {
        let codec = codec();
        let access = codec.sign_access(1, "Admin", "shared").unwrap();
        let refresh = codec.sign_refresh(1, "Admin", "shared").unwrap();

        assert_eq!(codec.verify(&access, SCOPE_ACCESS).unwrap().jti, "shared");
        assert_eq!(codec.verify(&refresh, SCOPE_REFRESH).unwrap().jti, "shared");
    }

    #[test]
    fn test_scope_mismatch_is_opaque() {
        let codec = codec();
        let refresh = codec.sign_refresh(1, "Admin", "jti-1").unwrap();

        // A refresh token presented as an access token is just invalid
        match codec.verify(&refresh, SCOPE_ACCESS) {
            Err(AdminError::InvalidToken) => {}
            other => panic!("expected InvalidToken, got {:?}", other.map(|c| c.scope)),
        }
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec();
        let token = codec.sign_access(1, "Admin", "jti-1").unwrap();
        let tampered = format!("{}x", &token[..token.len() - 1]);

        assert!(matches!(
            codec.verify(&tampered, SCOPE_ACCESS),
            Err(AdminError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let codec = codec();
        let mut other_auth = test_config().auth;
        other_auth.token_audience = "another-service".to_string();
        let other = TokenCodec::new(&other_auth);

        let token = other.sign_access(1, "Admin", "jti-1").unwrap();
        assert!(matches!(
            codec.verify(&token, SCOPE_ACCESS),
            Err(AdminError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut auth = test_config().auth;
        auth.access_ttl_hours = -1;
        let expired = TokenCodec::new(&auth);

        let token = expired.sign_access(1, "Admin", "jti-1").unwrap();
        assert!(matches!(
            codec().verify(&token, SCOPE_ACCESS),
            Err(AdminError::InvalidToken)
        ));
    }
}
