//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod breadcrumb;
mod collection;
mod form;
mod record;
mod record_type;
mod security;

pub use breadcrumb::{Breadcrumb, BreadcrumbTrail};
pub use collection::{Collection, CollectionFilter, CollectionKind};
pub use form::{
    FormAction, FormActionKind, FormField, FormMessage, FormSpec, MANY_MANY_NAMESPACE,
    MergeStrategy, MessageTone, html_escape, namespaced_field_name,
};
pub use record::{ID_FIELD, RECORD_TYPE_FIELD, Record, RecordId, TITLE_FIELD, is_falsy};
pub use record_type::{
    FieldDefinition, FieldKind, RecordTypeDefinition, RecordTypeRegistry, RelationDefinition,
    RelationKind, Validator,
};
pub use security::{ADMIN_PERMISSION_CODE, RecordCapabilities, RecordPermission};
