/// Admin identity, authorization and moderation
///
/// Credential verification, session ledger with refresh rotation,
/// role/permission resolution, the moderation-action executor, and the
/// append-only activity log.
pub mod accounts;
pub mod audit;
pub mod credentials;
pub mod moderation;
pub mod permissions;
pub mod reports;
pub mod sessions;

pub use accounts::{Admin, AdminDirectory};
pub use audit::{ActivityEntry, ActivityLog};
pub use credentials::{CredentialVerifier, LoginOutcome};
pub use moderation::{EnforcementAction, ModerationExecutor, ResolutionOutcome};
pub use reports::{Report, ReportStatus, ReportStore};
pub use sessions::{AdminSession, IssuedTokens, SessionLedger};

/// Client metadata carried into session rows and audit entries
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            user_agent: None,
        }
    }
}
