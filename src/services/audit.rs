use sqlx::MySqlPool;

use crate::models::{AuditAction, AuditEntry};
use crate::repositories::AuditLogRepository;

/// Fire-and-forget audit sink. Writes never fail the calling request.
#[derive(Clone)]
pub struct AuditSink {
    repo: AuditLogRepository,
}

impl AuditSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repo: AuditLogRepository::new(pool),
        }
    }

    pub async fn record(
        &self,
        action: AuditAction,
        target_resource: impl Into<String>,
        user_id: Option<String>,
        application_id: Option<String>,
        session_id: Option<String>,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry {
            user_id,
            application_id,
            session_id,
            action,
            target_resource: target_resource.into(),
            details,
        };

        if let Err(e) = self.repo.insert(&entry).await {
            tracing::warn!(error = %e, action = %entry.action, "failed to write audit log");
        }
    }
}
