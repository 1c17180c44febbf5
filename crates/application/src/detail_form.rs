mod configuration;
mod kinds;
mod services;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use configuration::{
    DEFAULT_COMPONENT_NAME, DEFAULT_TEMPLATE, DetailFormConfiguration, DetailFormExtension,
    ItemEditFormCallback,
};
pub use kinds::{GENERIC_ITEM_REQUEST_KIND, GenericItemRequest, ItemRequestKind, ItemRequestKindRegistry};
pub use services::DetailFormServices;

use gridform_core::{AppError, AppResult};
use gridform_domain::{Collection, Record, Validator};
use tracing::{debug, info};

use crate::item_exchange::{ItemAction, ItemRequest, ItemResponse};
use crate::item_request::{EnclosingHandler, ItemRequestHandler};

/// Detail form component of a hosted collection: configuration holder and
/// factory of item request handlers.
#[derive(Clone)]
pub struct DetailFormComponent {
    configuration: Arc<DetailFormConfiguration>,
    services: DetailFormServices,
}

impl DetailFormComponent {
    /// Creates a component. The configuration is shared read-only by every
    /// request the component handles.
    #[must_use]
    pub fn new(configuration: DetailFormConfiguration, services: DetailFormServices) -> Self {
        Self {
            configuration: Arc::new(configuration),
            services,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn configuration(&self) -> &DetailFormConfiguration {
        &self.configuration
    }

    /// Returns the collaborating services.
    #[must_use]
    pub fn services(&self) -> &DetailFormServices {
        &self.services
    }

    /// Returns the configured validator, else the one the record type
    /// supplies.
    #[must_use]
    pub fn validator_for(&self, record: &Record) -> Option<Validator> {
        self.configuration.validator().cloned().or_else(|| {
            self.services
                .record_types()
                .validator_for(record.record_type().as_str())
        })
    }

    /// Returns the handler kind name before extensions run: the configured
    /// override, else the per-component convention when registered, else the
    /// generic kind.
    #[must_use]
    pub fn item_request_kind_name(&self) -> String {
        if let Some(kind) = self.configuration.item_request_kind() {
            return kind.to_owned();
        }

        let convention = ItemRequestKindRegistry::convention_name(self.configuration.name());
        if self.services.kinds().find(&convention).is_some() {
            convention
        } else {
            GENERIC_ITEM_REQUEST_KIND.to_owned()
        }
    }

    /// Creates the handler for a resolved record.
    pub fn create_handler(
        &self,
        collection: Collection,
        record: Record,
        parent: EnclosingHandler,
    ) -> AppResult<ItemRequestHandler> {
        let mut kind_name = self.item_request_kind_name();
        for extension in self.configuration.extensions() {
            extension.update_item_request_kind(&mut kind_name, &collection, &record);
        }

        let kind = self.services.kinds().find(&kind_name).ok_or_else(|| {
            AppError::Internal(format!("item request kind '{kind_name}' is not registered"))
        })?;

        let mut handler = ItemRequestHandler::new(self.clone(), kind, collection, record, parent);
        handler.set_template(self.configuration.template());
        for extension in self.configuration.extensions() {
            extension.update_item_request_handler(&mut handler);
        }

        debug!(
            kind = %kind_name,
            link = %handler.link(None),
            "created item request handler"
        );
        Ok(handler)
    }

    /// Resolves the record of an item URL segment and creates its handler.
    pub async fn item_handler(
        &self,
        collection: Collection,
        id_segment: Option<&str>,
        parent: EnclosingHandler,
    ) -> AppResult<Arc<ItemRequestHandler>> {
        let record = self
            .services
            .resolver()
            .resolve(&collection, id_segment)
            .await?;

        self.create_handler(collection, record, parent).map(Arc::new)
    }

    /// Handles an item request end to end.
    ///
    /// A record missing from the collection redirects to the hosting page
    /// instead of failing, since it may have been removed concurrently.
    pub async fn handle_item(
        &self,
        collection: Collection,
        id_segment: Option<&str>,
        parent: EnclosingHandler,
        action: ItemAction,
        request: &ItemRequest,
    ) -> AppResult<ItemResponse> {
        let hosting_link = parent.link();
        match self.item_handler(collection, id_segment, parent).await {
            Ok(handler) => handler.handle(action, request).await,
            Err(AppError::NotFound(message)) => {
                info!(%message, location = %hosting_link, "item not found, redirecting");
                Ok(ItemResponse::redirect(hosting_link))
            }
            Err(error) => Err(error),
        }
    }
}
