use std::collections::BTreeMap;
use std::sync::Arc;

use gridform_core::{AppError, AppResult};
use gridform_domain::FormSpec;

use crate::item_request::ItemRequestHandler;

/// Name of the generic handler kind.
pub const GENERIC_ITEM_REQUEST_KIND: &str = "ItemRequest";

/// Named variant of item request handling.
pub trait ItemRequestKind: Send + Sync {
    /// Returns the registry name.
    fn name(&self) -> &str;

    /// Adjusts the assembled form before the configured callback runs.
    fn customise_form(&self, _handler: &ItemRequestHandler, _form: &mut FormSpec) {}
}

/// Handler kind without customisations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericItemRequest;

impl ItemRequestKind for GenericItemRequest {
    fn name(&self) -> &str {
        GENERIC_ITEM_REQUEST_KIND
    }
}

/// Registry of handler kinds by name. Always contains the generic kind.
#[derive(Clone)]
pub struct ItemRequestKindRegistry {
    kinds: BTreeMap<String, Arc<dyn ItemRequestKind>>,
}

impl ItemRequestKindRegistry {
    /// Creates a registry holding the generic kind.
    #[must_use]
    pub fn new() -> Self {
        let generic: Arc<dyn ItemRequestKind> = Arc::new(GenericItemRequest);
        Self {
            kinds: BTreeMap::from([(GENERIC_ITEM_REQUEST_KIND.to_owned(), generic)]),
        }
    }

    /// Returns the conventional kind name for a component, e.g.
    /// `DetailForm_ItemRequest`.
    #[must_use]
    pub fn convention_name(component_name: &str) -> String {
        format!("{component_name}_{GENERIC_ITEM_REQUEST_KIND}")
    }

    /// Registers a kind.
    pub fn register(&mut self, kind: Arc<dyn ItemRequestKind>) -> AppResult<()> {
        let name = kind.name().to_owned();
        if self.kinds.contains_key(&name) {
            return Err(AppError::Conflict(format!(
                "item request kind '{name}' is already registered"
            )));
        }

        self.kinds.insert(name, kind);
        Ok(())
    }

    /// Looks up a kind.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Arc<dyn ItemRequestKind>> {
        self.kinds.get(name).cloned()
    }
}

impl Default for ItemRequestKindRegistry {
    fn default() -> Self {
        Self::new()
    }
}
