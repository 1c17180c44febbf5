use gridform_core::{AppError, AppResult};
use gridform_domain::{
    FormMessage, FormSpec, MANY_MANY_NAMESPACE, MergeStrategy, MessageTone, RECORD_TYPE_FIELD,
    Record, RecordPermission, html_escape, namespaced_field_name,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::ItemRequestHandler;
use crate::content_negotiator::{CONTENT_FRAGMENT, FORM_FRAGMENT, ResponseNegotiator};
use crate::item_exchange::{ItemRequest, ItemResponse};
use crate::permission_gate::PermissionGate;
use crate::translations::SAVED_MESSAGE;

impl ItemRequestHandler {
    /// Saves submitted data into the record and its collection.
    ///
    /// Requires edit capability. Validation failures are reported on the
    /// form instead of failing the request.
    pub async fn do_save(
        &self,
        submitted: &Map<String, Value>,
        request: &ItemRequest,
    ) -> AppResult<ItemResponse> {
        let is_new_record = self.record.is_new();
        let record = self.prepared_record();
        let capabilities = self.capabilities(&record, request).await?;
        PermissionGate::require(capabilities, RecordPermission::Edit, &record)?;

        let form = self.item_edit_form(&record, capabilities).await?;
        let saved = match self.save_form_into_record(record, submitted, &form).await {
            Ok(saved) => saved,
            Err(AppError::Validation(message)) => {
                warn!(link = %self.link(None), %message, "item save failed validation");
                let mut form = form;
                form.load_data(submitted, MergeStrategy::Default);
                return self
                    .generate_validation_response(form, &message, request)
                    .await;
            }
            Err(error) => return Err(error),
        };

        let saved_handler = self.with_record(saved);
        request
            .messages()
            .set(&saved_handler.form_link(), saved_handler.saved_message())
            .await?;

        saved_handler
            .redirect_after_save(is_new_record, request)
            .await
    }

    /// Response after a successful save.
    ///
    /// New records redirect to their own link. Records still in the
    /// collection re-render the edit view at the same URL; records edited out
    /// of it send the client back to the hosting page.
    pub async fn redirect_after_save(
        &self,
        is_new_record: bool,
        request: &ItemRequest,
    ) -> AppResult<ItemResponse> {
        if is_new_record {
            return Ok(ItemResponse::redirect(self.link(None)));
        }

        let current = match self.record.id() {
            Some(id) => {
                self.component
                    .services()
                    .store()
                    .find_in_collection(&self.collection, id)
                    .await?
            }
            None => None,
        };

        match current {
            Some(current) => {
                info!(link = %self.link(None), "re-rendering saved item in place");
                self.with_record(current).edit(request).await
            }
            None => {
                info!(
                    link = %self.link(None),
                    "saved item left its collection, returning to hosting page"
                );
                Ok(ItemResponse::redirect_refreshing(
                    self.parent.link(),
                    CONTENT_FRAGMENT,
                ))
            }
        }
    }

    /// Copies submitted data into the record, writes it and adds it to the
    /// owning collection.
    pub async fn save_form_into_record(
        &self,
        record: Record,
        submitted: &Map<String, Value>,
        form: &FormSpec,
    ) -> AppResult<Record> {
        form.validate(submitted)?;

        let mut record = self.retype(record, submitted)?;
        form.save_into(&mut record, submitted)?;
        let extra_data = self.extra_saved_data(&mut record);

        let store = self.component.services().store();
        let written = store.write(record).await?;
        store
            .add_to_collection(&self.collection, &written, extra_data)
            .await?;

        info!(
            record_type = written.record_type().as_str(),
            record_id = written.id().map(|id| id.get()),
            collection = self.collection.name().as_str(),
            "saved item"
        );
        Ok(written)
    }

    /// Answers a failed save: the form fragment for any fragment request,
    /// otherwise a redirect back carrying the message in the session.
    pub async fn generate_validation_response(
        &self,
        mut form: FormSpec,
        message: &str,
        request: &ItemRequest,
    ) -> AppResult<ItemResponse> {
        let notice = FormMessage::text(message, MessageTone::Bad);
        form.set_message(notice.clone());

        // The client's fragment list is overridden; only the form is re-rendered.
        let requested = if request.is_fragment() {
            vec![FORM_FRAGMENT.to_owned()]
        } else {
            Vec::new()
        };

        let redirect_back = request
            .referer()
            .map_or_else(|| self.link(None), str::to_owned);
        let response = ResponseNegotiator::new(move || Ok(ItemResponse::redirect(redirect_back)))
            .fragment(FORM_FRAGMENT, || self.render_form_fragment(&form))
            .respond(&requested)?;

        if matches!(response, ItemResponse::Redirect { .. }) {
            request.messages().set(&self.form_link(), notice).await?;
        }

        Ok(response)
    }

    fn retype(&self, record: Record, submitted: &Map<String, Value>) -> AppResult<Record> {
        let requested_type = submitted
            .get(RECORD_TYPE_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|requested_type| !requested_type.is_empty());

        let Some(requested_type) = requested_type else {
            return Ok(record);
        };
        if requested_type == record.record_type().as_str() {
            return Ok(record);
        }

        let element_type = self.collection.element_type().as_str();
        if !self
            .component
            .services()
            .record_types()
            .is_a(requested_type, element_type)
        {
            return Err(AppError::Validation(format!(
                "'{requested_type}' is not a kind of '{element_type}'"
            )));
        }

        record.into_type(requested_type)
    }

    /// Takes namespaced many-to-many values off the record.
    fn extra_saved_data(&self, record: &mut Record) -> Option<Map<String, Value>> {
        if !self.collection.is_many_many() {
            return None;
        }

        let mut data = Map::new();
        for field in self.collection.extra_fields() {
            let saved_field = namespaced_field_name(MANY_MANY_NAMESPACE, field);
            if let Some(value) = record.take_field(&saved_field) {
                data.insert(field.clone(), value);
            }
        }
        Some(data)
    }

    fn saved_message(&self) -> FormMessage {
        let title = self.record.title().unwrap_or_default();
        let link = format!(
            "<a href=\"{}\">\"{}\"</a>",
            html_escape(&self.link(Some("edit"))),
            html_escape(title)
        );
        let singular_name = html_escape(&self.singular_name());
        let text = self.component.services().translations().text(
            SAVED_MESSAGE,
            &[("name", singular_name.as_str()), ("link", link.as_str())],
        );

        FormMessage::html(text, MessageTone::Good)
    }
}
