use async_trait::async_trait;
use gridform_core::AppResult;
use gridform_domain::{Collection, Record, RecordId};
use serde_json::{Map, Value};

/// Persistence port for records reachable through collections.
///
/// `write` and `delete` report rule violations as `AppError::Validation`;
/// any other error is an infrastructure failure.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Finds a record by id, constrained to the collection's membership.
    async fn find_in_collection(
        &self,
        collection: &Collection,
        id: RecordId,
    ) -> AppResult<Option<Record>>;

    /// Writes a record, assigning an id to unsaved records.
    async fn write(&self, record: Record) -> AppResult<Record>;

    /// Deletes a persisted record.
    async fn delete(&self, record: &Record) -> AppResult<()>;

    /// Adds a written record to a collection, storing per-membership data
    /// for many-to-many collections.
    async fn add_to_collection(
        &self,
        collection: &Collection,
        record: &Record,
        extra_data: Option<Map<String, Value>>,
    ) -> AppResult<()>;

    /// Returns the per-membership attributes stored for a record.
    async fn extra_data(
        &self,
        collection: &Collection,
        id: RecordId,
    ) -> AppResult<Map<String, Value>>;
}
