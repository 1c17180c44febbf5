use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use gridform_application::RecordPolicy;
use gridform_core::{AppResult, UserIdentity};
use gridform_domain::{
    ADMIN_PERMISSION_CODE, Record, RecordCapabilities, RecordPermission, RecordTypeRegistry,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;


/// Record flag restricting edit and delete to administrators.
pub const ONLY_ADMIN_FIELD: &str = "OnlyAdminCanApply";

/// Record policy deriving capabilities from permission codes granted to
/// each subject.
///
/// `ADMIN` grants everything. Otherwise a code `<Type>_<PERMISSION>` grants
/// one capability on records of that type and its subtypes.
#[derive(Debug)]
pub struct PermissionCodePolicy {
    record_types: Arc<RecordTypeRegistry>,
    grants: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl PermissionCodePolicy {
    /// Creates a policy without grants.
    #[must_use]
    pub fn new(record_types: Arc<RecordTypeRegistry>) -> Self {
        Self {
            record_types,
            grants: RwLock::new(HashMap::new()),
        }
    }

    /// Grants a permission code to a subject.
    pub async fn grant(&self, subject: &str, code: impl Into<String>) {
        self.grants
            .write()
            .await
            .entry(subject.to_owned())
            .or_default()
            .insert(code.into());
    }

    /// Returns the codes granted to a subject.
    pub async fn codes_for(&self, subject: &str) -> BTreeSet<String> {
        self.grants
            .read()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    fn code_grants(&self, code: &str, permission: RecordPermission, record_type: &str) -> bool {
        let Some((granted_type, granted_permission)) = code.rsplit_once('_') else {
            return false;
        };
        if !granted_permission.eq_ignore_ascii_case(permission.as_str()) {
            return false;
        }

        granted_type == record_type || self.record_types.is_a(record_type, granted_type)
    }
}

#[async_trait]
impl RecordPolicy for PermissionCodePolicy {
    async fn capabilities(
        &self,
        actor: &UserIdentity,
        record: &Record,
    ) -> AppResult<RecordCapabilities> {
        let codes = self.codes_for(actor.subject()).await;
        if codes.contains(ADMIN_PERMISSION_CODE) {
            return Ok(RecordCapabilities::all());
        }

        let record_type = record.record_type().as_str();
        let allows = |permission: RecordPermission| {
            codes
                .iter()
                .any(|code| self.code_grants(code, permission, record_type))
        };
        let admin_only = record.field(ONLY_ADMIN_FIELD) == Some(&Value::Bool(true));

        let capabilities = RecordCapabilities {
            can_view: allows(RecordPermission::View),
            can_edit: allows(RecordPermission::Edit) && !admin_only,
            can_delete: allows(RecordPermission::Delete) && !admin_only,
            can_create: allows(RecordPermission::Create),
        };
        debug!(
            subject = actor.subject(),
            record_type,
            admin_only,
            ?capabilities,
            "evaluated permission codes"
        );
        Ok(capabilities)
    }
}
