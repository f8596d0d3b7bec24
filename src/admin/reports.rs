/// Abuse report store
use crate::{
    content::ReportTarget,
    error::{AdminError, AdminResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor, SqlitePool};

/// Report lifecycle. `pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            _ => Err(AdminError::Validation(format!("Invalid report status: {}", s))),
        }
    }
}

/// Report record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub target_type: ReportTarget,
    pub target_id: i64,
    pub reporter_id: Option<i64>,
    pub reason: Option<String>,
    pub status: ReportStatus,
    pub assigned_to: Option<i64>,
    pub reviewed_by: Option<i64>,
    pub resolution_notes: Option<String>,
    pub action_taken: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ReportStore {
    db: SqlitePool,
}

impl ReportStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// File a report against a target entity
    pub async fn submit(
        &self,
        target_type: ReportTarget,
        target_id: i64,
        reporter_id: Option<i64>,
        reason: Option<&str>,
    ) -> AdminResult<Report> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO reports (target_type, target_id, reporter_id, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
        )
        .bind(target_type.as_str())
        .bind(target_id)
        .bind(reporter_id)
        .bind(reason)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(Report {
            id: result.last_insert_rowid(),
            target_type,
            target_id,
            reporter_id,
            reason: reason.map(String::from),
            status: ReportStatus::Pending,
            assigned_to: None,
            reviewed_by: None,
            resolution_notes: None,
            action_taken: None,
            created_at: now,
            reviewed_at: None,
        })
    }

    pub async fn get(&self, report_id: i64) -> AdminResult<Option<Report>> {
        self.get_with(&self.db, report_id).await
    }

    /// Load a report through the caller's executor, so the moderation
    /// executor reads inside its transaction
    pub async fn get_with<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        report_id: i64,
    ) -> AdminResult<Option<Report>> {
        let row = sqlx::query(
            "SELECT id, target_type, target_id, reporter_id, reason, status,
                    assigned_to, reviewed_by, resolution_notes, action_taken,
                    created_at, reviewed_at
             FROM reports
             WHERE id = ?1",
        )
        .bind(report_id)
        .fetch_optional(exec)
        .await?;

        row.map(parse_report).transpose()
    }

    /// List reports, optionally filtered by status, newest first
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: i64,
    ) -> AdminResult<Vec<Report>> {
        let rows = if let Some(status) = status {
            sqlx::query(
                "SELECT id, target_type, target_id, reporter_id, reason, status,
                        assigned_to, reviewed_by, resolution_notes, action_taken,
                        created_at, reviewed_at
                 FROM reports
                 WHERE status = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )
            .bind(status.as_str())
            .bind(limit)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query(
                "SELECT id, target_type, target_id, reporter_id, reason, status,
                        assigned_to, reviewed_by, resolution_notes, action_taken,
                        created_at, reviewed_at
                 FROM reports
                 ORDER BY created_at DESC
                 LIMIT ?1",
            )
            .bind(limit)
            .fetch_all(&self.db)
            .await?
        };

        rows.into_iter().map(parse_report).collect()
    }

    /// Move a pending report to a terminal status. Guarded by
    /// `status = 'pending'` so a report can only be finalized once; returns
    /// the number of rows updated.
    pub async fn finalize_with<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        report_id: i64,
        status: ReportStatus,
        notes: Option<&str>,
        action_taken: &str,
        reviewed_by: i64,
    ) -> AdminResult<u64> {
        let result = sqlx::query(
            "UPDATE reports
             SET status = ?1,
                 resolution_notes = ?2,
                 action_taken = ?3,
                 reviewed_by = ?4,
                 reviewed_at = ?5
             WHERE id = ?6 AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(notes)
        .bind(action_taken)
        .bind(reviewed_by)
        .bind(Utc::now())
        .bind(report_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }
}

fn parse_report(row: sqlx::sqlite::SqliteRow) -> AdminResult<Report> {
    let target_str: String = row.get("target_type");
    let status_str: String = row.get("status");

    Ok(Report {
        id: row.get("id"),
        target_type: ReportTarget::from_str(&target_str)?,
        target_id: row.get("target_id"),
        reporter_id: row.get("reporter_id"),
        reason: row.get("reason"),
        status: ReportStatus::from_str(&status_str)?,
        assigned_to: row.get("assigned_to"),
        reviewed_by: row.get("reviewed_by"),
        resolution_notes: row.get("resolution_notes"),
        action_taken: row.get("action_taken"),
        created_at: row.get("created_at"),
        reviewed_at: row.get("reviewed_at"),
    })
}
