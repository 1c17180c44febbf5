use std::collections::BTreeMap;
use std::sync::Arc;

use gridform_application::{DetailFormComponent, DetailFormServices, TemplateRenderer};
use gridform_core::AppError;
use gridform_infrastructure::{
    InMemoryRecordStore, MiniJinjaTemplateRenderer, PermissionCodePolicy,
};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::security_section::{
    component_configuration, record_types, relation_components, security_section,
};
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let record_types = Arc::new(record_types()?);
    let store = Arc::new(InMemoryRecordStore::new(record_types.clone()));
    let policy = Arc::new(PermissionCodePolicy::new(record_types.clone()));
    let renderer: Arc<dyn TemplateRenderer> = Arc::new(MiniJinjaTemplateRenderer::new()?);

    let services = DetailFormServices::new(
        store.clone(),
        policy.clone(),
        renderer.clone(),
        record_types.clone(),
    );

    let template = config.detail_form_template.as_deref();
    if let Some(template) = template {
        info!(%template, "detail form template overridden");
    }

    let security = Arc::new(security_section(&services, template)?);
    let sections = BTreeMap::from([(security.name().to_owned(), security)]);

    Ok(AppState {
        sections: Arc::new(sections),
        relation_components: Arc::new(relation_components(&services, template)?),
        default_component: DetailFormComponent::new(component_configuration(template)?, services),
        record_types,
        store,
        policy,
        renderer,
        dev_login_enabled: config.dev_login_enabled,
    })
}
