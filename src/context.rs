/// Application context and dependency wiring
use crate::{
    admin::{
        accounts::AdminDirectory, audit::ActivityLog, credentials::CredentialVerifier,
        moderation::ModerationExecutor, reports::ReportStore, sessions::SessionLedger,
    },
    config::ServerConfig,
    content::ContentDirectory,
    db,
    error::AdminResult,
    rate_limit::LoginRateLimiter,
    token::TokenCodec,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub codec: Arc<TokenCodec>,
    pub admins: Arc<AdminDirectory>,
    pub sessions: Arc<SessionLedger>,
    pub credentials: Arc<CredentialVerifier>,
    pub content: Arc<ContentDirectory>,
    pub reports: Arc<ReportStore>,
    pub moderation: Arc<ModerationExecutor>,
    pub audit: Arc<ActivityLog>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AdminResult<Self> {
        config.validate()?;

        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        Self::with_pool(config, pool).await
    }

    /// Wire the services over an existing pool
    pub async fn with_pool(config: ServerConfig, pool: SqlitePool) -> AdminResult<Self> {
        let codec = Arc::new(TokenCodec::new(&config.auth));
        let admins = AdminDirectory::new(pool.clone());
        let sessions = SessionLedger::new(pool.clone());
        let audit = ActivityLog::new(pool.clone());
        let content = ContentDirectory::new(pool.clone());
        let reports = ReportStore::new(pool.clone());

        let credentials = CredentialVerifier::new(
            pool.clone(),
            codec.clone(),
            admins.clone(),
            sessions.clone(),
            audit.clone(),
        );
        let moderation = ModerationExecutor::new(
            pool.clone(),
            reports.clone(),
            content.clone(),
            audit.clone(),
        );
        let login_limiter = LoginRateLimiter::new(&config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            codec,
            admins: Arc::new(admins),
            sessions: Arc::new(sessions),
            credentials: Arc::new(credentials),
            content: Arc::new(content),
            reports: Arc::new(reports),
            moderation: Arc::new(moderation),
            audit: Arc::new(audit),
            login_limiter: Arc::new(login_limiter),
        })
    }
}
