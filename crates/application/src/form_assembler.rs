
use std::sync::Arc;

use gridform_core::AppResult;
use gridform_domain::{
    FormAction, FormField, FormSpec, MANY_MANY_NAMESPACE, MergeStrategy, Record,
    RecordCapabilities, RecordPermission, RecordTypeRegistry,
};
use serde_json::{Map, Value};

use crate::content_negotiator::{CONTENT_FRAGMENT, FORM_FRAGMENT};
use crate::detail_form_ports::RecordStore;
use crate::item_exchange::DELETE_ACTION_FIELD;
use crate::item_request::{ITEM_FORM_NAME, ItemRequestHandler};
use crate::permission_gate::PermissionGate;
use crate::translations::{CANCEL_LABEL, CREATE_LABEL, DELETE_LABEL, SAVE_LABEL, Translations};

/// Builds the edit form of one record.
#[derive(Clone)]
pub struct FormAssembler {
    store: Arc<dyn RecordStore>,
    record_types: Arc<RecordTypeRegistry>,
    translations: Arc<Translations>,
}

impl FormAssembler {
    /// Creates an assembler.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        record_types: Arc<RecordTypeRegistry>,
        translations: Arc<Translations>,
    ) -> Self {
        Self {
            store,
            record_types,
            translations,
        }
    }

    /// Builds the form for a prepared record of the handler.
    ///
    /// Fails with `Forbidden` when the record cannot be viewed. Persisted
    /// records without edit capability get a read-only form that keeps the
    /// delete action usable when deletion is allowed; unsaved records
    /// without create capability get a read-only form.
    pub async fn build(
        &self,
        handler: &ItemRequestHandler,
        record: &Record,
        capabilities: RecordCapabilities,
    ) -> AppResult<FormSpec> {
        PermissionGate::require(capabilities, RecordPermission::View, record)?;

        let configuration = handler.component().configuration();
        let collection = handler.collection();
        let actions = self.form_actions(handler, record, capabilities);

        let definitions = match configuration.fields() {
            Some(fields) => fields.to_vec(),
            None => self
                .record_types
                .default_fields(record.record_type().as_str())?,
        };
        let fields = definitions
            .iter()
            .map(FormField::from_definition)
            .collect::<Vec<_>>();

        let mut form = FormSpec::new(
            ITEM_FORM_NAME,
            fields,
            actions,
            handler.component().validator_for(record),
        );

        if let Some((foreign_key, _)) = collection.foreign_key() {
            form.make_field_read_only(foreign_key);
        }

        let strategy = if record.is_new() {
            MergeStrategy::IgnoreFalsy
        } else {
            MergeStrategy::Default
        };
        form.load_data(&record.form_values(), strategy);

        match record.id() {
            Some(_) if !capabilities.can_edit => {
                form.make_read_only();
                if capabilities.can_delete
                    && let Some(delete) = form.action_mut(DELETE_ACTION_FIELD)
                {
                    delete.set_read_only(false);
                }
            }
            None if !capabilities.can_create => form.make_read_only(),
            _ => {}
        }

        if collection.is_many_many()
            && let Some(id) = record.id()
        {
            let extra_data = self.store.extra_data(collection, id).await?;
            let mut namespaced = Map::new();
            namespaced.insert(MANY_MANY_NAMESPACE.to_owned(), Value::Object(extra_data));
            form.load_data(&namespaced, MergeStrategy::Default);
        }

        form.set_action_url(handler.form_link());
        if handler.toplevel_controller().is_page_chrome() {
            form.add_extra_class("cms-content cms-edit-form center");
            form.add_fragment(FORM_FRAGMENT);
            form.add_fragment(CONTENT_FRAGMENT);
            form.set_back_link(handler.back_link());
        }

        handler.kind().customise_form(handler, &mut form);
        if let Some(callback) = configuration.item_edit_form_callback() {
            callback(&mut form, handler);
        }
        for extension in configuration.extensions() {
            extension.update_item_edit_form(handler, &mut form);
        }

        Ok(form)
    }

    /// Builds the actions available on a record.
    #[must_use]
    pub fn form_actions(
        &self,
        handler: &ItemRequestHandler,
        record: &Record,
        capabilities: RecordCapabilities,
    ) -> Vec<FormAction> {
        let mut actions = Vec::new();
        if record.is_new() {
            if capabilities.can_create {
                actions.push(
                    FormAction::submit("doSave", self.translations.text(CREATE_LABEL, &[]))
                        .with_class("action-constructive"),
                );
            }

            let one_level_up = handler
                .breadcrumbs()
                .and_then(|trail| trail.one_level_up().cloned());
            if let Some(crumb) = one_level_up {
                actions.push(
                    FormAction::link(
                        "cancelbutton",
                        self.translations.text(CANCEL_LABEL, &[]),
                        crumb.link().unwrap_or_default(),
                    )
                    .with_class("crumb action-destructive"),
                );
            }
        } else {
            if capabilities.can_edit {
                actions.push(
                    FormAction::submit("doSave", self.translations.text(SAVE_LABEL, &[]))
                        .with_class("action-constructive"),
                );
            }
            if capabilities.can_delete {
                actions.push(
                    FormAction::submit("doDelete", self.translations.text(DELETE_LABEL, &[]))
                        .with_class("action-destructive action-delete"),
                );
            }
        }

        for extension in handler.component().configuration().extensions() {
            extension.update_form_actions(handler, &mut actions);
        }
        actions
    }
}
