use std::sync::Arc;

use gridform_application::RecordStore;
use gridform_core::AppError;
use gridform_domain::{
    Collection, CollectionFilter, FieldDefinition, FieldKind, Record, RecordId,
    RecordTypeDefinition, RecordTypeRegistry, RelationDefinition,
};
use serde_json::{Map, Value, json};

use super::InMemoryRecordStore;

fn id(value: u64) -> RecordId {
    RecordId::new(value).unwrap_or_else(|_| unreachable!())
}

fn registry() -> RecordTypeRegistry {
    let role = RecordTypeDefinition::new(
        "PermissionRole",
        "Role",
        vec![
            FieldDefinition::new("Title", "Title", FieldKind::Text, true, None)
                .unwrap_or_else(|_| unreachable!()),
        ],
    )
    .and_then(|definition| {
        definition.with_relation(RelationDefinition::has_many(
            "Codes",
            "PermissionRoleCode",
            "RoleID",
            true,
        )?)
    })
    .and_then(|definition| {
        definition.with_relation(RelationDefinition::many_many(
            "Groups",
            "Group",
            vec!["Sort".to_owned()],
        )?)
    })
    .unwrap_or_else(|_| unreachable!());
    let code = RecordTypeDefinition::new("PermissionRoleCode", "Role Code", Vec::new())
        .unwrap_or_else(|_| unreachable!());
    let group = RecordTypeDefinition::new("Group", "Group", Vec::new())
        .unwrap_or_else(|_| unreachable!());
    let restricted = RecordTypeDefinition::new("RestrictedRole", "Restricted Role", Vec::new())
        .and_then(|definition| definition.with_parent("PermissionRole"))
        .unwrap_or_else(|_| unreachable!());

    let mut registry = RecordTypeRegistry::new();
    for definition in [role, code, group, restricted] {
        assert!(registry.register(definition).is_ok());
    }
    registry
}

fn store() -> InMemoryRecordStore {
    InMemoryRecordStore::new(Arc::new(registry()))
}

fn unsaved(record_type: &str, fields: Value) -> Record {
    let mut record = Record::new(record_type).unwrap_or_else(|_| unreachable!());
    if let Value::Object(fields) = fields {
        for (name, value) in fields {
            record.set_field(name, value);
        }
    }
    record
}

async fn written(store: &InMemoryRecordStore, record_type: &str, fields: Value) -> Record {
    store
        .write(unsaved(record_type, fields))
        .await
        .unwrap_or_else(|_| unreachable!())
}

fn roles() -> Collection {
    Collection::filtered("Roles", "PermissionRole", Vec::new()).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn write_assigns_sequential_ids_and_resets_changes() {
    let store = store();
    let first = written(&store, "PermissionRole", json!({"Title": "Editors"})).await;
    let second = written(&store, "PermissionRole", json!({"Title": "Authors"})).await;

    assert_eq!(first.id(), Some(id(1)));
    assert_eq!(second.id(), Some(id(2)));
    assert!(second.changed_fields().is_empty());
}

#[tokio::test]
async fn ids_of_deleted_records_are_never_reused() {
    let store = store();
    written(&store, "PermissionRole", json!({"Title": "Editors"})).await;
    let authors = written(&store, "PermissionRole", json!({"Title": "Authors"})).await;
    assert!(store.delete(&authors).await.is_ok());

    let admins = written(&store, "PermissionRole", json!({"Title": "Administrators"})).await;

    assert_eq!(admins.id(), Some(id(3)));
    let stale = store.find_in_collection(&roles(), id(2)).await;
    assert!(matches!(stale, Ok(None)));
}

#[tokio::test]
async fn write_rejects_missing_required_field() {
    let store = store();
    let result = store.write(unsaved("PermissionRole", json!({"Title": " "}))).await;

    assert!(matches!(result, Err(AppError::Validation(message)) if message.contains("Title")));
}

#[tokio::test]
async fn write_of_unknown_id_is_not_found() {
    let store = store();
    let ghost = Record::persisted(id(9), "Group", Map::new()).unwrap_or_else(|_| unreachable!());

    assert!(matches!(store.write(ghost).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn collection_membership_follows_type_lineage_and_filters() {
    let store = store();
    let restricted = written(&store, "RestrictedRole", json!({"Title": "Auditors"})).await;
    let group = written(&store, "Group", json!({})).await;
    let restricted_id = restricted.id().unwrap_or_else(|| unreachable!());
    let group_id = group.id().unwrap_or_else(|| unreachable!());

    let found = store.find_in_collection(&roles(), restricted_id).await;
    assert!(matches!(found, Ok(Some(_))));
    let found = store.find_in_collection(&roles(), group_id).await;
    assert!(matches!(found, Ok(None)));

    let filtered = Collection::filtered(
        "Editors",
        "PermissionRole",
        vec![CollectionFilter {
            field_name: "Title".to_owned(),
            value: json!("Editors"),
        }],
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(store.list(&filtered).await.unwrap_or_default().is_empty());
    assert_eq!(store.list(&roles()).await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn many_many_membership_stores_declared_extra_fields() {
    let store = store();
    let role = written(&store, "PermissionRole", json!({"Title": "Editors"})).await;
    let group = written(&store, "Group", json!({})).await;
    let role_id = role.id().unwrap_or_else(|| unreachable!());
    let group_id = group.id().unwrap_or_else(|| unreachable!());
    let groups = Collection::many_many("Groups", "Group", role_id, vec!["Sort".to_owned()])
        .unwrap_or_else(|_| unreachable!());

    let before = store.find_in_collection(&groups, group_id).await;
    assert!(matches!(before, Ok(None)));

    let mut extra_data = Map::new();
    extra_data.insert("Sort".to_owned(), json!(3));
    extra_data.insert("Unknown".to_owned(), json!("dropped"));
    assert!(
        store
            .add_to_collection(&groups, &group, Some(extra_data))
            .await
            .is_ok()
    );

    let after = store.find_in_collection(&groups, group_id).await;
    assert!(matches!(after, Ok(Some(_))));
    let stored = store.extra_data(&groups, group_id).await.unwrap_or_default();
    assert_eq!(stored.get("Sort"), Some(&json!(3)));
    assert!(!stored.contains_key("Unknown"));
}

#[tokio::test]
async fn delete_cascades_to_owned_codes_only() {
    let store = store();
    let editors = written(&store, "PermissionRole", json!({"Title": "Editors"})).await;
    let authors = written(&store, "PermissionRole", json!({"Title": "Authors"})).await;
    let editors_id = editors.id().unwrap_or_else(|| unreachable!());
    let authors_id = authors.id().unwrap_or_else(|| unreachable!());
    written(&store, "PermissionRoleCode", json!({"RoleID": editors_id.get()})).await;
    written(&store, "PermissionRoleCode", json!({"RoleID": editors_id.get()})).await;
    written(&store, "PermissionRoleCode", json!({"RoleID": authors_id.get()})).await;

    assert!(store.delete(&editors).await.is_ok());

    let editor_codes = Collection::has_many("Codes", "PermissionRoleCode", "RoleID", editors_id)
        .unwrap_or_else(|_| unreachable!());
    let author_codes = Collection::has_many("Codes", "PermissionRoleCode", "RoleID", authors_id)
        .unwrap_or_else(|_| unreachable!());
    assert!(store.list(&editor_codes).await.unwrap_or_default().is_empty());
    assert_eq!(store.list(&author_codes).await.unwrap_or_default().len(), 1);
    assert!(matches!(
        store.find_in_collection(&roles(), editors_id).await,
        Ok(None)
    ));
}

#[tokio::test]
async fn deleting_unsaved_record_is_rejected() {
    let store = store();
    let result = store.delete(&unsaved("Group", json!({}))).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}
