use std::sync::Arc;

use gridform_core::{AppError, AppResult, UserIdentity};
use gridform_domain::{Record, RecordCapabilities, RecordPermission};
use tracing::debug;

use crate::detail_form_ports::RecordPolicy;

/// Evaluates record capabilities for the current actor on every call.
#[derive(Clone)]
pub struct PermissionGate {
    policy: Arc<dyn RecordPolicy>,
}

impl PermissionGate {
    /// Creates a gate over an authorization policy.
    #[must_use]
    pub fn new(policy: Arc<dyn RecordPolicy>) -> Self {
        Self { policy }
    }

    /// Returns the four capabilities of the actor on the record.
    pub async fn capabilities(
        &self,
        actor: &UserIdentity,
        record: &Record,
    ) -> AppResult<RecordCapabilities> {
        let capabilities = self.policy.capabilities(actor, record).await?;
        debug!(
            subject = actor.subject(),
            record_type = record.record_type().as_str(),
            record_id = record.id().map(|id| id.get()),
            ?capabilities,
            "evaluated record capabilities"
        );
        Ok(capabilities)
    }

    /// Fails with `Forbidden` unless the capability is granted.
    pub fn require(
        capabilities: RecordCapabilities,
        permission: RecordPermission,
        record: &Record,
    ) -> AppResult<()> {
        if capabilities.allows(permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "missing '{}' permission on {} '{}'",
            permission.as_str(),
            record.record_type(),
            record.display_title()
        )))
    }
}
