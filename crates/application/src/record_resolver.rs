use std::sync::Arc;

use gridform_core::{AppError, AppResult};
use gridform_domain::{Collection, Record, RecordId, RecordTypeRegistry};

use crate::detail_form_ports::RecordStore;

/// Resolves the record an item URL points at.
#[derive(Clone)]
pub struct RecordResolver {
    store: Arc<dyn RecordStore>,
    record_types: Arc<RecordTypeRegistry>,
}

impl RecordResolver {
    /// Creates a resolver over a store and the known record types.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, record_types: Arc<RecordTypeRegistry>) -> Self {
        Self {
            store,
            record_types,
        }
    }

    /// Resolves an id segment within a collection.
    ///
    /// Numeric segments must name a member of the collection; anything else,
    /// including a missing segment or `new`, yields an unsaved record of the
    /// collection's element type.
    pub async fn resolve(
        &self,
        collection: &Collection,
        id_segment: Option<&str>,
    ) -> AppResult<Record> {
        let segment = id_segment.map(str::trim).filter(|segment| !segment.is_empty());
        match segment {
            Some(segment) if segment.chars().all(|character| character.is_ascii_digit()) => {
                let id = RecordId::parse(segment).ok_or_else(|| {
                    AppError::NotFound(format!("record '{segment}' does not exist"))
                })?;

                self.store
                    .find_in_collection(collection, id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "record '{id}' is not part of collection '{}'",
                            collection.name()
                        ))
                    })
            }
            _ => self.instantiate(collection),
        }
    }

    fn instantiate(&self, collection: &Collection) -> AppResult<Record> {
        let element_type = collection.element_type().as_str();
        if self.record_types.find(element_type).is_some() {
            self.record_types.instantiate(element_type)
        } else {
            Record::new(element_type)
        }
    }
}
