use gridform_application::RecordStore;
use gridform_core::AppResult;
use gridform_domain::{ADMIN_PERMISSION_CODE, Collection, Record, RecordPermission};
use gridform_infrastructure::ONLY_ADMIN_FIELD;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::state::AppState;

/// Subject granted every permission.
pub const DEV_SEED_ADMIN_SUBJECT: &str = "admin";

/// Subject managing roles and codes, with read and edit access to groups.
pub const DEV_SEED_EDITOR_SUBJECT: &str = "editor";

/// Seeds demo roles, codes and groups plus the grants of the demo subjects.
pub async fn run(state: &AppState) -> AppResult<()> {
    let editors = write(state, "PermissionRole", json!({"Title": "Editors"})).await?;
    let authors = write(state, "PermissionRole", json!({"Title": "Authors"})).await?;
    let administrators = write(
        state,
        "PermissionRole",
        json!({"Title": "Administrators", ONLY_ADMIN_FIELD: true}),
    )
    .await?;

    for (role, code) in [
        (&editors, "CMS_ACCESS"),
        (&editors, "SITETREE_EDIT_ALL"),
        (&authors, "CMS_ACCESS"),
        (&administrators, ADMIN_PERMISSION_CODE),
    ] {
        let role_id = role.id().map(|id| id.to_value()).unwrap_or(Value::Null);
        write(
            state,
            "PermissionRoleCode",
            json!({"Code": code, "RoleID": role_id}),
        )
        .await?;
    }

    let content_authors = write(state, "Group", json!({"Title": "Content Authors"})).await?;
    let site_admins = write(state, "Group", json!({"Title": "Site Administrators"})).await?;

    for (role, group, sort) in [
        (&editors, &content_authors, 1),
        (&authors, &content_authors, 2),
        (&administrators, &site_admins, 1),
    ] {
        let Some(role_id) = role.id() else {
            continue;
        };
        let groups = Collection::many_many("Groups", "Group", role_id, vec!["Sort".to_owned()])?;
        let mut extra_data = Map::new();
        extra_data.insert("Sort".to_owned(), json!(sort));
        state
            .store
            .add_to_collection(&groups, group, Some(extra_data))
            .await?;
    }

    state
        .policy
        .grant(DEV_SEED_ADMIN_SUBJECT, ADMIN_PERMISSION_CODE)
        .await;
    for record_type in ["PermissionRole", "PermissionRoleCode"] {
        for permission in RecordPermission::all() {
            state
                .policy
                .grant(DEV_SEED_EDITOR_SUBJECT, permission.code_for(record_type))
                .await;
        }
    }
    for permission in [RecordPermission::View, RecordPermission::Edit] {
        state
            .policy
            .grant(DEV_SEED_EDITOR_SUBJECT, permission.code_for("Group"))
            .await;
    }

    info!("development seed data loaded");
    Ok(())
}

async fn write(state: &AppState, record_type: &str, fields: Value) -> AppResult<Record> {
    let mut record = state.record_types.instantiate(record_type)?;
    if let Value::Object(fields) = fields {
        for (name, value) in fields {
            record.set_field(name, value);
        }
    }

    state.store.write(record).await
}
