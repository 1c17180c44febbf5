use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use gridform_application::RecordStore;
use gridform_core::{AppError, AppResult};
use gridform_domain::{
    Collection, CollectionKind, Record, RecordId, RecordTypeRegistry, RelationDefinition,
    RelationKind,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Owner id, relation name and member id of one many-to-many membership.
type MembershipKey = (RecordId, String, RecordId);

/// In-memory record store honouring record type lineage, one-to-many
/// cascades and many-to-many membership attributes.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    record_types: Arc<RecordTypeRegistry>,
    records: RwLock<BTreeMap<RecordId, Record>>,
    memberships: RwLock<HashMap<MembershipKey, Map<String, Value>>>,
    /// Highest id ever assigned; ids of deleted records are never reused.
    last_id: AtomicU64,
}

impl InMemoryRecordStore {
    /// Creates an empty store for the given record types.
    #[must_use]
    pub fn new(record_types: Arc<RecordTypeRegistry>) -> Self {
        Self {
            record_types,
            records: RwLock::new(BTreeMap::new()),
            memberships: RwLock::new(HashMap::new()),
            last_id: AtomicU64::new(0),
        }
    }

    /// Lists the members of a collection in id order.
    pub async fn list(&self, collection: &Collection) -> AppResult<Vec<Record>> {
        let records = self.records.read().await;
        let memberships = self.memberships.read().await;

        Ok(records
            .values()
            .filter(|record| self.is_member(collection, record, &memberships))
            .cloned()
            .collect())
    }

    fn is_member(
        &self,
        collection: &Collection,
        record: &Record,
        memberships: &HashMap<MembershipKey, Map<String, Value>>,
    ) -> bool {
        let record_type = record.record_type().as_str();
        let element_type = collection.element_type().as_str();
        if record_type != element_type && !self.record_types.is_a(record_type, element_type) {
            return false;
        }
        if !collection.matches_fields(record) {
            return false;
        }

        match (collection.kind(), record.id()) {
            (
                CollectionKind::ManyMany {
                    relation_name,
                    owner_id,
                    ..
                },
                Some(id),
            ) => memberships.contains_key(&(*owner_id, relation_name.clone(), id)),
            (CollectionKind::ManyMany { .. }, None) => false,
            _ => true,
        }
    }

    /// Relations declared on the type and its ancestors.
    fn relations_of(&self, record_type: &str) -> Vec<RelationDefinition> {
        let mut relations = Vec::new();
        let mut current = self.record_types.find(record_type);
        while let Some(definition) = current {
            relations.extend(definition.relations().iter().cloned());
            current = definition
                .parent_type()
                .and_then(|parent| self.record_types.find(parent.as_str()));
        }
        relations
    }

    fn ensure_required_fields(&self, record: &Record) -> AppResult<()> {
        let record_type = record.record_type().as_str();
        if self.record_types.find(record_type).is_none() {
            return Ok(());
        }

        for field in self.record_types.default_fields(record_type)? {
            if !field.is_required() {
                continue;
            }

            let missing = match record.field(field.name().as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(text)) => text.trim().is_empty(),
                Some(_) => false,
            };
            if missing {
                return Err(AppError::Validation(format!(
                    "'{}' is required",
                    field.label()
                )));
            }
        }
        Ok(())
    }

    /// Ids of the record and every one-to-many descendant removed with it.
    fn cascade_targets(&self, root: &Record, records: &BTreeMap<RecordId, Record>) -> Vec<RecordId> {
        let mut targets = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(owner) = pending.pop() {
            let Some(owner_id) = owner.id() else {
                continue;
            };
            if targets.contains(&owner_id) {
                continue;
            }
            targets.push(owner_id);

            for relation in self.relations_of(owner.record_type().as_str()) {
                let RelationKind::HasMany {
                    foreign_key,
                    cascade_delete: true,
                } = relation.kind()
                else {
                    continue;
                };

                pending.extend(
                    records
                        .values()
                        .filter(|child| {
                            child.field(foreign_key).and_then(RecordId::from_value)
                                == Some(owner_id)
                                && self.record_types.is_a(
                                    child.record_type().as_str(),
                                    relation.target_type().as_str(),
                                )
                        })
                        .cloned(),
                );
            }
        }
        targets
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_in_collection(
        &self,
        collection: &Collection,
        id: RecordId,
    ) -> AppResult<Option<Record>> {
        let records = self.records.read().await;
        let memberships = self.memberships.read().await;

        Ok(records
            .get(&id)
            .filter(|record| self.is_member(collection, record, &memberships))
            .cloned())
    }

    async fn write(&self, record: Record) -> AppResult<Record> {
        self.ensure_required_fields(&record)?;

        let mut records = self.records.write().await;
        let id = match record.id() {
            Some(id) if records.contains_key(&id) => id,
            Some(id) => {
                return Err(AppError::NotFound(format!("record '{id}' does not exist")));
            }
            None => {
                RecordId::new(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)?
            }
        };

        let written = record.into_written(id);
        records.insert(id, written.clone());
        debug!(
            record_type = written.record_type().as_str(),
            record_id = id.get(),
            "record written"
        );
        Ok(written)
    }

    async fn delete(&self, record: &Record) -> AppResult<()> {
        let id = record
            .id()
            .ok_or_else(|| AppError::Validation("unsaved records cannot be deleted".to_owned()))?;

        let mut records = self.records.write().await;
        let stored = records
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("record '{id}' does not exist")))?;

        let targets = self.cascade_targets(&stored, &records);
        for target in &targets {
            records.remove(target);
        }
        self.memberships
            .write()
            .await
            .retain(|(owner_id, _, member_id), _| {
                !targets.contains(owner_id) && !targets.contains(member_id)
            });

        info!(
            record_type = stored.record_type().as_str(),
            record_id = id.get(),
            cascaded = targets.len().saturating_sub(1),
            "record deleted"
        );
        Ok(())
    }

    async fn add_to_collection(
        &self,
        collection: &Collection,
        record: &Record,
        extra_data: Option<Map<String, Value>>,
    ) -> AppResult<()> {
        let CollectionKind::ManyMany {
            relation_name,
            owner_id,
            extra_fields,
        } = collection.kind()
        else {
            return Ok(());
        };
        let id = record
            .id()
            .ok_or_else(|| AppError::Validation("unsaved records cannot be linked".to_owned()))?;

        let mut memberships = self.memberships.write().await;
        let membership = memberships
            .entry((*owner_id, relation_name.clone(), id))
            .or_default();
        for (field, value) in extra_data.unwrap_or_default() {
            if extra_fields.contains(&field) {
                membership.insert(field, value);
            }
        }
        Ok(())
    }

    async fn extra_data(
        &self,
        collection: &Collection,
        id: RecordId,
    ) -> AppResult<Map<String, Value>> {
        let CollectionKind::ManyMany {
            relation_name,
            owner_id,
            ..
        } = collection.kind()
        else {
            return Ok(Map::new());
        };

        Ok(self
            .memberships
            .read()
            .await
            .get(&(*owner_id, relation_name.clone(), id))
            .cloned()
            .unwrap_or_default())
    }
}
