//! Record detail request handling: ports and the dispatch components.

#![forbid(unsafe_code)]

mod content_negotiator;
mod detail_form;
mod detail_form_ports;
mod form_assembler;
mod item_exchange;
mod item_request;
mod links;
mod permission_gate;
mod record_resolver;
mod translations;

#[cfg(test)]
mod test_support;

pub use content_negotiator::{
    CONTENT_FRAGMENT, ContentNegotiator, FORM_FRAGMENT, ResponseNegotiator,
};
pub use detail_form::{
    DEFAULT_COMPONENT_NAME, DEFAULT_TEMPLATE, DetailFormComponent, DetailFormConfiguration,
    DetailFormExtension, DetailFormServices, GENERIC_ITEM_REQUEST_KIND, GenericItemRequest,
    ItemEditFormCallback, ItemRequestKind, ItemRequestKindRegistry,
};
pub use detail_form_ports::{
    FormMessageStore, PageContent, PageController, RecordPolicy, RecordStore, TemplateRenderer,
};
pub use form_assembler::FormAssembler;
pub use item_exchange::{
    DELETE_ACTION_FIELD, ItemAction, ItemRequest, ItemResponse, SAVE_ACTION_FIELD,
};
pub use item_request::{
    EnclosingHandler, ITEM_FORM_NAME, ITEM_FORM_TEMPLATE, ItemRequestHandler, PAGE_FORM_NAME,
};
pub use links::join_links;
pub use permission_gate::PermissionGate;
pub use record_resolver::RecordResolver;
pub use translations::Translations;
