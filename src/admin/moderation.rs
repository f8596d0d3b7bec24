/// Moderation action executor
///
/// Applies a report resolution together with its optional enforcement
/// action. The resolution and a requested ban commit as one transaction;
/// content deletion runs afterwards on its own, so a failed delete of a large
/// media object never unwinds an enforcement that already landed.
use crate::{
    admin::{
        audit::ActivityLog,
        reports::{ReportStatus, ReportStore},
        ClientInfo,
    },
    content::{ContentDirectory, ReportTarget},
    error::{AdminError, AdminResult},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Optional enforcement applied while resolving a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementAction {
    None,
    BanUser,
    DeleteContent,
}

impl EnforcementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementAction::None => "none",
            EnforcementAction::BanUser => "ban_user",
            EnforcementAction::DeleteContent => "delete_content",
        }
    }
}

impl Default for EnforcementAction {
    fn default() -> Self {
        EnforcementAction::None
    }
}

/// What a resolution actually did. `partial` is set when the committed half
/// succeeded but content deletion did not.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    pub report_id: i64,
    pub status: ReportStatus,
    pub user_banned: bool,
    pub banned_user_id: Option<i64>,
    pub content_deleted: bool,
    pub partial: bool,
    pub message: Option<String>,
}

pub struct ModerationExecutor {
    db: SqlitePool,
    reports: ReportStore,
    content: ContentDirectory,
    audit: ActivityLog,
}

impl ModerationExecutor {
    pub fn new(
        db: SqlitePool,
        reports: ReportStore,
        content: ContentDirectory,
        audit: ActivityLog,
    ) -> Self {
        Self {
            db,
            reports,
            content,
            audit,
        }
    }

    /// Resolve or dismiss a pending report, optionally banning the owning
    /// user or deleting the reported content.
    pub async fn resolve_report(
        &self,
        report_id: i64,
        status: ReportStatus,
        notes: Option<String>,
        action: EnforcementAction,
        acting_admin: i64,
        client: &ClientInfo,
    ) -> AdminResult<ResolutionOutcome> {
        if status == ReportStatus::Pending {
            return Err(AdminError::Validation(
                "Reports can only be resolved or dismissed".to_string(),
            ));
        }

        // Enforcement only makes sense when the report is upheld
        if status == ReportStatus::Dismissed && action != EnforcementAction::None {
            return Err(AdminError::Validation(
                "Enforcement actions require a resolved status".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let report = self
            .reports
            .get_with(&mut *tx, report_id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("report {} not found", report_id)))?;

        if report.status != ReportStatus::Pending {
            return Err(AdminError::Conflict(format!(
                "report {} is already {}",
                report_id,
                report.status.as_str()
            )));
        }

        if action == EnforcementAction::DeleteContent && report.target_type == ReportTarget::User {
            return Err(AdminError::Validation(
                "user targets are banned, not deleted".to_string(),
            ));
        }

        let updated = self
            .reports
            .finalize_with(
                &mut *tx,
                report_id,
                status,
                notes.as_deref(),
                action.as_str(),
                acting_admin,
            )
            .await?;
        if updated == 0 {
            // A concurrent resolution got there first
            return Err(AdminError::Conflict(format!(
                "report {} is no longer pending",
                report_id
            )));
        }

        // The ban joins the status update in one atomic unit: if the owning
        // user cannot be resolved or written, the whole resolution rolls back
        // and the report stays pending.
        let banned_user_id = if action == EnforcementAction::BanUser {
            let owner = self
                .content
                .owner_of(&mut *tx, report.target_type, report.target_id)
                .await?;
            self.content.ban_user(&mut *tx, owner).await?;
            Some(owner)
        } else {
            None
        };

        tx.commit().await?;

        let detail = serde_json::json!({
            "action_taken": action.as_str(),
            "banned_user_id": banned_user_id,
        })
        .to_string();
        let resource_id = report_id.to_string();
        self.audit
            .append(
                acting_admin,
                match status {
                    ReportStatus::Resolved => "reports.resolve",
                    _ => "reports.dismiss",
                },
                Some(("report", resource_id.as_str())),
                Some(detail.as_str()),
                client,
            )
            .await?;

        // Fan-out to the notification service happens here in the wider
        // platform, after the transaction, never inside it.
        tracing::info!(
            report_id,
            status = status.as_str(),
            action = action.as_str(),
            "report finalized"
        );

        let mut outcome = ResolutionOutcome {
            report_id,
            status,
            user_banned: banned_user_id.is_some(),
            banned_user_id,
            content_deleted: false,
            partial: false,
            message: None,
        };

        // Deletion runs outside the transaction: the committed resolution and
        // ban stand even if the delete fails.
        if action == EnforcementAction::DeleteContent {
            match self
                .content
                .delete_content(report.target_type, report.target_id)
                .await
            {
                Ok(()) => {
                    outcome.content_deleted = true;
                }
                Err(e) => {
                    tracing::warn!(
                        report_id,
                        target = report.target_type.as_str(),
                        target_id = report.target_id,
                        "content deletion failed after resolution: {}",
                        e
                    );
                    outcome.partial = true;
                    outcome.message = Some(format!(
                        "report resolved, but deleting {} {} failed and requires manual follow-up",
                        report.target_type.as_str(),
                        report.target_id
                    ));
                }
            }
        }

        Ok(outcome)
    }
}
