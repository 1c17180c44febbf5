use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gridform_application::{DetailFormComponent, TemplateRenderer};
use gridform_core::{AppError, AppResult};
use gridform_domain::RecordTypeRegistry;
use gridform_infrastructure::{InMemoryRecordStore, PermissionCodePolicy};

use crate::admin_section::AdminSection;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sections: Arc<BTreeMap<String, Arc<AdminSection>>>,
    pub relation_components: Arc<HashMap<String, DetailFormComponent>>,
    pub default_component: DetailFormComponent,
    pub record_types: Arc<RecordTypeRegistry>,
    pub store: Arc<InMemoryRecordStore>,
    pub policy: Arc<PermissionCodePolicy>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub dev_login_enabled: bool,
}

impl AppState {
    pub fn section(&self, name: &str) -> AppResult<Arc<AdminSection>> {
        self.sections
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("admin section '{name}' does not exist")))
    }

    /// Component editing records reached through a relation of an enclosing
    /// record.
    pub fn relation_component(&self, relation_name: &str) -> &DetailFormComponent {
        self.relation_components
            .get(relation_name)
            .unwrap_or(&self.default_component)
    }
}
