use std::sync::Arc;

use gridform_domain::RecordTypeRegistry;

use super::ItemRequestKindRegistry;
use crate::detail_form_ports::{RecordPolicy, RecordStore, TemplateRenderer};
use crate::form_assembler::FormAssembler;
use crate::permission_gate::PermissionGate;
use crate::record_resolver::RecordResolver;
use crate::translations::Translations;

/// Collaborators shared by every detail form component.
#[derive(Clone)]
pub struct DetailFormServices {
    store: Arc<dyn RecordStore>,
    policy: Arc<dyn RecordPolicy>,
    renderer: Arc<dyn TemplateRenderer>,
    record_types: Arc<RecordTypeRegistry>,
    translations: Arc<Translations>,
    kinds: Arc<ItemRequestKindRegistry>,
}

impl DetailFormServices {
    /// Creates services with English translations and the generic handler
    /// kind only.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        policy: Arc<dyn RecordPolicy>,
        renderer: Arc<dyn TemplateRenderer>,
        record_types: Arc<RecordTypeRegistry>,
    ) -> Self {
        Self {
            store,
            policy,
            renderer,
            record_types,
            translations: Arc::new(Translations::english()),
            kinds: Arc::new(ItemRequestKindRegistry::new()),
        }
    }

    /// Replaces the translation catalog.
    #[must_use]
    pub fn with_translations(mut self, translations: Translations) -> Self {
        self.translations = Arc::new(translations);
        self
    }

    /// Replaces the handler kind registry.
    #[must_use]
    pub fn with_kinds(mut self, kinds: ItemRequestKindRegistry) -> Self {
        self.kinds = Arc::new(kinds);
        self
    }

    /// Returns the record store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Returns the template renderer.
    #[must_use]
    pub fn renderer(&self) -> &Arc<dyn TemplateRenderer> {
        &self.renderer
    }

    /// Returns the record type registry.
    #[must_use]
    pub fn record_types(&self) -> &Arc<RecordTypeRegistry> {
        &self.record_types
    }

    /// Returns the translation catalog.
    #[must_use]
    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Returns the handler kind registry.
    #[must_use]
    pub fn kinds(&self) -> &ItemRequestKindRegistry {
        &self.kinds
    }

    /// Returns a record resolver over these services.
    #[must_use]
    pub fn resolver(&self) -> RecordResolver {
        RecordResolver::new(Arc::clone(&self.store), Arc::clone(&self.record_types))
    }

    /// Returns a permission gate over the policy.
    #[must_use]
    pub fn gate(&self) -> PermissionGate {
        PermissionGate::new(Arc::clone(&self.policy))
    }

    /// Returns a form assembler over these services.
    #[must_use]
    pub fn assembler(&self) -> FormAssembler {
        FormAssembler::new(
            Arc::clone(&self.store),
            Arc::clone(&self.record_types),
            Arc::clone(&self.translations),
        )
    }
}
