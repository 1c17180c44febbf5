use std::sync::Arc;

use gridform_core::AppError;
use gridform_domain::{
    Collection, CollectionFilter, FieldDefinition, FieldKind, MessageTone, Record,
    RecordCapabilities,
};
use serde_json::{Map, json};

use crate::test_support::{
    FakeController, Fixture, SECTION_LINK, controller, id, record, registry, roles, title_data,
};
use crate::{
    DetailFormConfiguration, EnclosingHandler, ItemRequestHandler, ItemResponse, PageController,
};

const ROLE_LINK: &str = "/admin/security/EditForm/field/Roles/item/5";

fn handler(
    fixture: &Fixture,
    collection: Collection,
    record: Record,
    parent: EnclosingHandler,
) -> ItemRequestHandler {
    fixture
        .component
        .create_handler(collection, record, parent)
        .unwrap_or_else(|_| unreachable!())
}

fn editors() -> Record {
    record(
        5,
        "PermissionRole",
        json!({"Title": "Editors", "OnlyAdminCanApply": false}),
    )
}

#[tokio::test]
async fn saving_unchanged_record_round_trips_and_rerenders_in_place() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let mut submitted = title_data("Editors");
    submitted.insert("OnlyAdminCanApply".to_owned(), json!("0"));
    let response = handler
        .do_save(&submitted, &fixture.request())
        .await
        .unwrap_or_else(|_| unreachable!());

    let stored = fixture.store.stored(5).await;
    assert_eq!(stored.as_ref().map(Record::fields), Some(editors().fields()));
    match response {
        ItemResponse::Content { body, fragment } => {
            assert!(body.starts_with("<page"));
            assert!(body.contains("Saved Role"));
            assert!(fragment.is_none());
        }
        other => panic!("expected in-place render, got {other:?}"),
    }
    assert!(
        fixture
            .messages
            .peek(&format!("{ROLE_LINK}/ItemEditForm"))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn new_record_save_redirects_to_its_own_link() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let new_role = registry()
        .instantiate("PermissionRole")
        .unwrap_or_else(|_| unreachable!());
    let handler = handler(&fixture, roles(), new_role, controller(true));
    assert_eq!(handler.link(None), "/admin/security/EditForm/field/Roles/item/new");

    let response = handler
        .do_save(&title_data("Alpha"), &fixture.request())
        .await;

    assert_eq!(
        response.ok(),
        Some(ItemResponse::redirect(
            "/admin/security/EditForm/field/Roles/item/1"
        ))
    );
    assert_eq!(
        fixture.store.stored(1).await.and_then(|record| record.title().map(str::to_owned)),
        Some("Alpha".to_owned())
    );
    let notice = fixture
        .messages
        .peek("/admin/security/EditForm/field/Roles/item/1/ItemEditForm")
        .await;
    assert_eq!(notice.map(|notice| notice.tone()), Some(MessageTone::Good));
}

#[tokio::test]
async fn save_that_leaves_filtered_collection_returns_to_hosting_page() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    let open_roles = Collection::filtered(
        "Roles",
        "PermissionRole",
        vec![CollectionFilter {
            field_name: "OnlyAdminCanApply".to_owned(),
            value: json!(false),
        }],
    )
    .unwrap_or_else(|_| unreachable!());
    let handler = handler(&fixture, open_roles, editors(), controller(true));

    let mut submitted = title_data("Editors");
    submitted.insert("OnlyAdminCanApply".to_owned(), json!("1"));
    let response = handler.do_save(&submitted, &fixture.request()).await;

    assert_eq!(
        response.ok(),
        Some(ItemResponse::redirect_refreshing(SECTION_LINK, "Content"))
    );
}

#[tokio::test]
async fn persistence_validation_failure_targets_form_fragment() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    fixture.store.reject_writes("Title is already taken").await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler
        .do_save(&title_data("Authors"), &fixture.fragment_request())
        .await
        .unwrap_or_else(|_| unreachable!());

    match response {
        ItemResponse::Content { body, fragment } => {
            assert_eq!(fragment.as_deref(), Some("CurrentForm"));
            assert!(body.starts_with("[ItemEditForm]"));
            assert!(body.contains("Title is already taken"));
        }
        other => panic!("expected form fragment, got {other:?}"),
    }
    assert_eq!(
        fixture.store.stored(5).await.and_then(|record| record.title().map(str::to_owned)),
        Some("Editors".to_owned())
    );
}

#[tokio::test]
async fn validator_failure_on_full_page_redirects_back_with_message() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));
    let request = fixture.request().with_referer("/admin/security?page=2");

    let response = handler.do_save(&title_data(""), &request).await;

    assert_eq!(
        response.ok(),
        Some(ItemResponse::redirect("/admin/security?page=2"))
    );
    let notice = fixture
        .messages
        .peek(&format!("{ROLE_LINK}/ItemEditForm"))
        .await;
    assert!(notice.is_some_and(|notice| {
        notice.tone() == MessageTone::Bad && notice.as_html().contains("Title")
    }));
    assert_eq!(
        fixture.store.stored(5).await.and_then(|record| record.title().map(str::to_owned)),
        Some("Editors".to_owned())
    );
}

#[tokio::test]
async fn failed_save_targets_form_fragment_whatever_was_requested() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));
    let request = fixture
        .request()
        .as_fragment(vec!["Content".to_owned(), "Breadcrumbs".to_owned()]);

    let response = handler.do_save(&title_data(""), &request).await;

    assert!(matches!(
        response,
        Ok(ItemResponse::Content { body, fragment })
            if fragment.as_deref() == Some("CurrentForm") && body.starts_with("[ItemEditForm]")
    ));
}

#[tokio::test]
async fn failed_save_keeps_submitted_values_in_form() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    fixture.store.reject_writes("Title is already taken").await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler
        .do_save(&title_data("Authors-typed-in"), &fixture.fragment_request())
        .await
        .unwrap_or_else(|_| unreachable!());

    match response {
        ItemResponse::Content { body, .. } => assert!(body.contains("Authors-typed-in")),
        other => panic!("expected form fragment, got {other:?}"),
    }
}

#[tokio::test]
async fn save_requires_edit_capability() {
    let fixture = Fixture::new(RecordCapabilities {
        can_view: true,
        ..RecordCapabilities::default()
    });
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler
        .do_save(&title_data("Authors"), &fixture.request())
        .await;

    assert!(matches!(response, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn changed_record_type_is_rematerialised() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let mut submitted = title_data("Editors");
    submitted.insert("RecordType".to_owned(), json!("RestrictedRole"));
    assert!(handler.do_save(&submitted, &fixture.request()).await.is_ok());
    assert_eq!(
        fixture
            .store
            .stored(5)
            .await
            .map(|record| record.record_type().as_str().to_owned()),
        Some("RestrictedRole".to_owned())
    );

    let mut submitted = title_data("Editors");
    submitted.insert("RecordType".to_owned(), json!("Group"));
    let response = handler
        .do_save(&submitted, &fixture.request())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(response, ItemResponse::Redirect { .. }));
}

#[tokio::test]
async fn many_many_save_moves_extra_fields_to_membership() {
    let fields = vec![
        FieldDefinition::new("Title", "Title", FieldKind::Text, false, None)
            .unwrap_or_else(|_| unreachable!()),
        FieldDefinition::new("ManyMany[Sort]", "Sort", FieldKind::Number, false, None)
            .unwrap_or_else(|_| unreachable!()),
    ];
    let configuration = DetailFormConfiguration::new()
        .unwrap_or_else(|_| unreachable!())
        .with_fields(fields);
    let fixture = Fixture::with_configuration(RecordCapabilities::all(), configuration);
    let staff = record(3, "Group", json!({"Title": "Staff"}));
    fixture.store.insert_member(staff.clone(), Map::new()).await;
    let groups = Collection::many_many("Groups", "Group", id(1), vec!["Sort".to_owned()])
        .unwrap_or_else(|_| unreachable!());
    let handler = handler(&fixture, groups, staff, controller(true));

    let mut submitted = title_data("Staff");
    submitted.insert("ManyMany[Sort]".to_owned(), json!("9"));
    assert!(handler.do_save(&submitted, &fixture.request()).await.is_ok());

    assert_eq!(
        fixture
            .store
            .membership(3)
            .await
            .and_then(|data| data.get("Sort").cloned()),
        Some(json!(9))
    );
    assert!(
        fixture
            .store
            .stored(3)
            .await
            .is_some_and(|record| !record.has_field("ManyMany[Sort]"))
    );
}

#[tokio::test]
async fn delete_without_permission_redirects_back_without_deleting() {
    let fixture = Fixture::new(RecordCapabilities {
        can_view: true,
        can_edit: true,
        ..RecordCapabilities::default()
    });
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler.do_delete(&fixture.request()).await;

    assert_eq!(
        response.ok(),
        Some(ItemResponse::redirect_refreshing(SECTION_LINK, "Content"))
    );
    assert_eq!(*fixture.store.delete_calls.lock().await, 0);
    assert!(fixture.store.stored(5).await.is_some());
    let notice = fixture.messages.peek("/admin/security/EditForm").await;
    assert_eq!(
        notice.map(|notice| notice.as_html().to_owned()),
        Some("No delete permissions".to_owned())
    );
}

#[tokio::test]
async fn delete_under_page_chrome_notifies_page_form() {
    let fixture = Fixture::new(RecordCapabilities::all());
    fixture.store.insert(editors()).await;
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler.do_delete(&fixture.request()).await;

    assert_eq!(
        response.ok(),
        Some(ItemResponse::redirect_refreshing(SECTION_LINK, "Content"))
    );
    assert!(fixture.store.stored(5).await.is_none());
    let notice = fixture.messages.peek("/admin/security/EditForm").await;
    assert!(notice.is_some_and(|notice| notice.as_html() == "Deleted Role Editors"));
}

#[tokio::test]
async fn nested_delete_returns_to_enclosing_record() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let code = record(
        9,
        "PermissionRoleCode",
        json!({"Code": "CMS_ACCESS", "RoleID": 5}),
    );
    fixture.store.insert(code.clone()).await;
    let role_handler = Arc::new(handler(&fixture, roles(), editors(), controller(true)));
    let codes = Collection::has_many("Codes", "PermissionRoleCode", "RoleID", id(5))
        .unwrap_or_else(|_| unreachable!());
    let code_handler = handler(&fixture, codes, code, EnclosingHandler::Item(role_handler));

    let response = code_handler.do_delete(&fixture.request()).await;

    assert_eq!(
        response.ok(),
        Some(ItemResponse::redirect_refreshing(ROLE_LINK, "Content"))
    );
    let local_key = format!("{ROLE_LINK}/ItemEditForm/field/Codes/item/9/ItemEditForm");
    assert!(fixture.messages.peek(&local_key).await.is_some());
}

#[tokio::test]
async fn toplevel_controller_is_found_at_every_depth() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let page: Arc<dyn PageController> = Arc::new(FakeController {
        page_chrome: true,
        back_link: None,
    });

    for depth in [0_u64, 1, 3] {
        let mut parent = EnclosingHandler::Controller(Arc::clone(&page));
        for level in 1..=depth {
            let enclosing = handler(
                &fixture,
                roles(),
                record(level, "PermissionRole", json!({"Title": format!("Role {level}")})),
                parent,
            );
            parent = EnclosingHandler::Item(Arc::new(enclosing));
        }
        let leaf = handler(&fixture, roles(), editors(), parent);

        assert!(Arc::ptr_eq(&leaf.toplevel_controller(), &page));
        let trail = leaf.breadcrumbs().unwrap_or_default();
        assert_eq!(trail.len() as u64, depth + 2);
        assert_eq!(trail.last().map(|crumb| crumb.title()), Some("Editors"));
    }
}

#[tokio::test]
async fn explicit_controller_back_link_wins() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let parent = EnclosingHandler::Controller(Arc::new(FakeController {
        page_chrome: true,
        back_link: Some("/admin".to_owned()),
    }));
    let handler = handler(&fixture, roles(), editors(), parent);

    assert_eq!(handler.back_link(), "/admin");
}

#[tokio::test]
async fn view_requires_view_capability() {
    let fixture = Fixture::new(RecordCapabilities {
        can_edit: true,
        ..RecordCapabilities::default()
    });
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler.view(&fixture.request()).await;

    assert!(matches!(response, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn fragment_view_skips_page_chrome() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let handler = handler(&fixture, roles(), editors(), controller(true));

    let response = handler
        .view(&fixture.fragment_request())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(
        response,
        ItemResponse::Content { body, .. }
            if body.starts_with("[GridFieldDetailForm]") && body.contains("\"read_only\":true")
    ));
}

#[tokio::test]
async fn unsaved_record_breadcrumb_is_unlinked() {
    let fixture = Fixture::new(RecordCapabilities::all());
    let new_role = registry()
        .instantiate("PermissionRole")
        .unwrap_or_else(|_| unreachable!());
    let handler = handler(&fixture, roles(), new_role, controller(true));

    let trail = handler.breadcrumbs().unwrap_or_default();
    assert_eq!(trail.last().map(|crumb| crumb.title()), Some("New Role"));
    assert_eq!(trail.last().and_then(|crumb| crumb.link()), None);
}
