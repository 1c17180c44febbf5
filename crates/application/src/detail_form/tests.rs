use std::sync::Arc;

use gridform_core::AppError;
use gridform_domain::{Collection, Record, RecordCapabilities, Validator};
use serde_json::{Map, Value, json};

use super::{
    DetailFormComponent, DetailFormConfiguration, DetailFormExtension, ItemRequestKind,
    ItemRequestKindRegistry,
};
use crate::test_support::{Fixture, SECTION_LINK, controller, record, roles, title_data};
use crate::{ItemAction, ItemResponse};

struct NamedKind(&'static str);

impl ItemRequestKind for NamedKind {
    fn name(&self) -> &str {
        self.0
    }
}

struct AuditNewRecords;

impl DetailFormExtension for AuditNewRecords {
    fn update_item_request_kind(&self, kind: &mut String, _collection: &Collection, record: &Record) {
        if record.is_new() {
            *kind = "Audited".to_owned();
        }
    }
}

fn component_with(
    configuration: DetailFormConfiguration,
    kinds: &[&'static str],
) -> DetailFormComponent {
    let fixture = Fixture::new(RecordCapabilities::all());
    let mut registry = ItemRequestKindRegistry::new();
    for name in kinds.iter().copied() {
        assert!(registry.register(Arc::new(NamedKind(name))).is_ok());
    }

    DetailFormComponent::new(
        configuration,
        fixture.component.services().clone().with_kinds(registry),
    )
}

fn new_role() -> Record {
    Record::new("PermissionRole").unwrap_or_else(|_| unreachable!())
}

fn default_configuration() -> DetailFormConfiguration {
    DetailFormConfiguration::new().unwrap_or_else(|_| unreachable!())
}

#[test]
fn generic_kind_is_used_without_registrations() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let handler = fixture
        .component
        .create_handler(roles(), new_role(), controller(true))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(handler.kind().name(), "ItemRequest");
    assert_eq!(handler.template(), "GridFieldDetailForm");
}

#[test]
fn convention_kind_is_picked_when_registered() {
    let component = component_with(default_configuration(), &["DetailForm_ItemRequest"]);
    assert_eq!(component.item_request_kind_name(), "DetailForm_ItemRequest");

    let renamed = default_configuration()
        .with_name("RoleForm")
        .unwrap_or_else(|_| unreachable!());
    let component = component_with(renamed, &["DetailForm_ItemRequest"]);
    assert_eq!(component.item_request_kind_name(), "ItemRequest");
}

#[test]
fn configured_kind_overrides_convention() {
    let configuration = default_configuration().with_item_request_kind("Custom");
    let component = component_with(configuration, &["Custom", "DetailForm_ItemRequest"]);

    let handler = component
        .create_handler(roles(), new_role(), controller(true))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(handler.kind().name(), "Custom");
}

#[test]
fn extensions_may_rewrite_kind_per_record() {
    let configuration = default_configuration().with_extension(Arc::new(AuditNewRecords));
    let component = component_with(configuration, &["Audited"]);

    let new_handler = component
        .create_handler(roles(), new_role(), controller(true))
        .unwrap_or_else(|_| unreachable!());
    let existing_handler = component
        .create_handler(
            roles(),
            record(5, "PermissionRole", json!({"Title": "Editors"})),
            controller(true),
        )
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(new_handler.kind().name(), "Audited");
    assert_eq!(existing_handler.kind().name(), "ItemRequest");
}

#[test]
fn unregistered_kind_is_an_internal_error() {
    let configuration = default_configuration().with_item_request_kind("Missing");
    let component = component_with(configuration, &[]);

    let handler = component.create_handler(roles(), new_role(), controller(true));
    assert!(matches!(handler, Err(AppError::Internal(_))));
}

#[test]
fn configured_template_reaches_handler() {
    let configuration = default_configuration()
        .with_template("RoleDetail")
        .unwrap_or_else(|_| unreachable!());
    let component = component_with(configuration, &[]);

    let handler = component
        .create_handler(roles(), new_role(), controller(true))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(handler.template(), "RoleDetail");
}

#[test]
fn configured_validator_replaces_record_type_validator() {
    let fixture = Fixture::new(RecordCapabilities::all());
    assert!(matches!(
        fixture.component.validator_for(&new_role()),
        Some(Validator::RequiredFields(fields)) if fields == ["Title"]
    ));

    let configuration = default_configuration().with_validator(Validator::Custom(Arc::new(
        |_data: &Map<String, Value>| Err::<(), String>("always rejected".to_owned()),
    )));
    let component = component_with(configuration, &[]);
    assert!(matches!(
        component.validator_for(&new_role()),
        Some(Validator::Custom(_))
    ));
}

#[tokio::test]
async fn missing_record_redirects_to_hosting_page() {
    let fixture = Fixture::new(RecordCapabilities::all());

    for segment in ["42", "0"] {
        let response = fixture
            .component
            .handle_item(
                roles(),
                Some(segment),
                controller(true),
                ItemAction::Edit,
                &fixture.request(),
            )
            .await;

        assert_eq!(response.ok(), Some(ItemResponse::redirect(SECTION_LINK)));
    }
}

#[tokio::test]
async fn non_numeric_segment_edits_a_new_record() {
    let fixture = Fixture::new(RecordCapabilities::all());

    let response = fixture
        .component
        .handle_item(
            roles(),
            Some("new"),
            controller(true),
            ItemAction::Edit,
            &fixture.request(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(
        response,
        ItemResponse::Content { body, .. }
            if body.starts_with("<page title=\"New Role\">")
    ));
}

#[tokio::test]
async fn submissions_are_dispatched_to_save() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture
        .store
        .insert(record(5, "PermissionRole", json!({"Title": "Editors"})))
        .await;
    let action = ItemAction::from_submission(title_data("Authors")).unwrap_or_else(|_| unreachable!());

    let response = fixture
        .component
        .handle_item(roles(), Some("5"), controller(true), action, &fixture.request())
        .await;

    assert!(matches!(response, Ok(ItemResponse::Content { .. })));
    assert_eq!(
        fixture
            .store
            .stored(5)
            .await
            .and_then(|record| record.title().map(str::to_owned)),
        Some("Authors".to_owned())
    );
}
