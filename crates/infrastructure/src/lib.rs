//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_record_store;
mod minijinja_template_renderer;
mod permission_code_policy;

pub use in_memory_record_store::InMemoryRecordStore;
pub use minijinja_template_renderer::{
    ADMIN_LAYOUT_TEMPLATE, ADMIN_SECTION_TEMPLATE, MiniJinjaTemplateRenderer,
};
pub use permission_code_policy::{ONLY_ADMIN_FIELD, PermissionCodePolicy};
