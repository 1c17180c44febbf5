use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use gridform_core::{AppResult, NonEmptyString};
use gridform_domain::{Collection, FieldDefinition, FormAction, FormSpec, Record, Validator};

use crate::item_request::ItemRequestHandler;

/// Default component name.
pub const DEFAULT_COMPONENT_NAME: &str = "DetailForm";

/// Default template of the detail view.
pub const DEFAULT_TEMPLATE: &str = "GridFieldDetailForm";

/// Per-record form customisation, run last during form assembly.
pub type ItemEditFormCallback = Arc<dyn Fn(&mut FormSpec, &ItemRequestHandler) + Send + Sync>;

/// Mutators invoked at the component's extension points. Every method
/// defaults to leaving its input unchanged.
pub trait DetailFormExtension: Send + Sync {
    /// Rewrites the handler kind before the handler is created.
    fn update_item_request_kind(&self, _kind: &mut String, _collection: &Collection, _record: &Record) {}

    /// Adjusts a freshly created handler.
    fn update_item_request_handler(&self, _handler: &mut ItemRequestHandler) {}

    /// Adjusts the form actions.
    fn update_form_actions(&self, _handler: &ItemRequestHandler, _actions: &mut Vec<FormAction>) {}

    /// Adjusts the assembled form.
    fn update_item_edit_form(&self, _handler: &ItemRequestHandler, _form: &mut FormSpec) {}
}

/// Configuration of a detail form component.
#[derive(Clone)]
pub struct DetailFormConfiguration {
    name: NonEmptyString,
    template: NonEmptyString,
    fields: Option<Vec<FieldDefinition>>,
    validator: Option<Validator>,
    item_request_kind: Option<String>,
    item_edit_form_callback: Option<ItemEditFormCallback>,
    extensions: Vec<Arc<dyn DetailFormExtension>>,
}

impl DetailFormConfiguration {
    /// Creates a configuration with the default name and template.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(DEFAULT_COMPONENT_NAME)?,
            template: NonEmptyString::new(DEFAULT_TEMPLATE)?,
            fields: None,
            validator: None,
            item_request_kind: None,
            item_edit_form_callback: None,
            extensions: Vec::new(),
        })
    }

    /// Sets the component name.
    pub fn with_name(mut self, name: impl Into<String>) -> AppResult<Self> {
        self.name = NonEmptyString::new(name)?;
        Ok(self)
    }

    /// Sets the detail view template.
    pub fn with_template(mut self, template: impl Into<String>) -> AppResult<Self> {
        self.template = NonEmptyString::new(template)?;
        Ok(self)
    }

    /// Overrides the field set of every record.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Sets the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Forces a handler kind.
    #[must_use]
    pub fn with_item_request_kind(mut self, kind: impl Into<String>) -> Self {
        self.item_request_kind = Some(kind.into());
        self
    }

    /// Sets the per-record form callback.
    #[must_use]
    pub fn with_item_edit_form_callback(mut self, callback: ItemEditFormCallback) -> Self {
        self.item_edit_form_callback = Some(callback);
        self
    }

    /// Registers an extension.
    #[must_use]
    pub fn with_extension(mut self, extension: Arc<dyn DetailFormExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the detail view template.
    #[must_use]
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    /// Returns the field set override.
    #[must_use]
    pub fn fields(&self) -> Option<&[FieldDefinition]> {
        self.fields.as_deref()
    }

    /// Returns the configured validator.
    #[must_use]
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Returns the forced handler kind.
    #[must_use]
    pub fn item_request_kind(&self) -> Option<&str> {
        self.item_request_kind.as_deref()
    }

    /// Returns the per-record form callback.
    #[must_use]
    pub fn item_edit_form_callback(&self) -> Option<&ItemEditFormCallback> {
        self.item_edit_form_callback.as_ref()
    }

    /// Returns registered extensions in registration order.
    #[must_use]
    pub fn extensions(&self) -> &[Arc<dyn DetailFormExtension>] {
        &self.extensions
    }
}

impl Debug for DetailFormConfiguration {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DetailFormConfiguration")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("fields", &self.fields)
            .field("validator", &self.validator)
            .field("item_request_kind", &self.item_request_kind)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
