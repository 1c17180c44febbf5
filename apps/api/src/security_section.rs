use std::collections::HashMap;
use std::sync::Arc;

use gridform_application::{DetailFormComponent, DetailFormConfiguration, DetailFormServices};
use gridform_core::AppResult;
use gridform_domain::{
    Collection, FieldDefinition, FieldKind, MANY_MANY_NAMESPACE, RecordTypeDefinition,
    RecordTypeRegistry, RelationDefinition, Validator, namespaced_field_name,
};
use gridform_infrastructure::ONLY_ADMIN_FIELD;
use serde_json::{Map, Value};

use crate::admin_section::{AdminSection, HostedCollection};

/// URL segment of the security admin section.
pub const SECURITY_SECTION: &str = "security";

/// Record types managed by the security section.
pub fn record_types() -> AppResult<RecordTypeRegistry> {
    let role = RecordTypeDefinition::new(
        "PermissionRole",
        "Role",
        vec![
            FieldDefinition::new("Title", "Title", FieldKind::Text, true, None)?,
            FieldDefinition::new("Description", "Description", FieldKind::TextArea, false, None)?,
            FieldDefinition::new(
                ONLY_ADMIN_FIELD,
                "Only admin can apply",
                FieldKind::Checkbox,
                false,
                Some(Value::Bool(false)),
            )?,
        ],
    )?
    .with_relation(RelationDefinition::has_many(
        "Codes",
        "PermissionRoleCode",
        "RoleID",
        true,
    )?)?
    .with_relation(RelationDefinition::many_many(
        "Groups",
        "Group",
        vec!["Sort".to_owned()],
    )?)?
    .with_validator(Validator::RequiredFields(vec!["Title".to_owned()]));

    let code = RecordTypeDefinition::new(
        "PermissionRoleCode",
        "Role Code",
        vec![
            FieldDefinition::new("Code", "Code", FieldKind::Text, true, None)?,
            FieldDefinition::new("RoleID", "Role", FieldKind::Number, false, None)?,
        ],
    )?
    .with_validator(Validator::Custom(Arc::new(validate_permission_code)));

    let group = RecordTypeDefinition::new(
        "Group",
        "Group",
        vec![
            FieldDefinition::new("Title", "Title", FieldKind::Text, true, None)?,
            FieldDefinition::new("Description", "Description", FieldKind::TextArea, false, None)?,
        ],
    )?;

    let mut registry = RecordTypeRegistry::new();
    for definition in [role, code, group] {
        registry.register(definition)?;
    }
    Ok(registry)
}

/// Permission codes are upper-case identifiers such as `CMS_ACCESS`.
fn validate_permission_code(data: &Map<String, Value>) -> Result<(), String> {
    let code = data
        .get("Code")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if code.is_empty() {
        return Err("A permission code is required".to_owned());
    }
    if !code
        .chars()
        .all(|character| character.is_ascii_uppercase() || character.is_ascii_digit() || character == '_')
    {
        return Err(format!(
            "'{code}' may only contain upper-case letters, digits and underscores"
        ));
    }

    Ok(())
}

/// Base component configuration, honouring a configured template override.
pub fn component_configuration(template: Option<&str>) -> AppResult<DetailFormConfiguration> {
    let configuration = DetailFormConfiguration::new()?;
    match template {
        Some(template) => configuration.with_template(template),
        None => Ok(configuration),
    }
}

/// Builds the security section hosting roles and groups.
pub fn security_section(
    services: &DetailFormServices,
    template: Option<&str>,
) -> AppResult<AdminSection> {
    let roles = HostedCollection::new(
        "Roles",
        Collection::filtered("Roles", "PermissionRole", Vec::new())?,
        DetailFormComponent::new(component_configuration(template)?, services.clone()),
    );
    let groups = HostedCollection::new(
        "Groups",
        Collection::filtered("Groups", "Group", Vec::new())?,
        DetailFormComponent::new(component_configuration(template)?, services.clone()),
    );

    Ok(AdminSection::new(SECURITY_SECTION, "Security")?
        .with_collection(roles)
        .with_collection(groups))
}

/// Components for relations whose nested forms differ from the record
/// type's default fields, keyed by relation name.
pub fn relation_components(
    services: &DetailFormServices,
    template: Option<&str>,
) -> AppResult<HashMap<String, DetailFormComponent>> {
    // Group memberships of a role also edit the join row's sort order.
    let group_membership = component_configuration(template)?
        .with_name("RoleGroups")?
        .with_fields(vec![
            FieldDefinition::new("Title", "Title", FieldKind::Text, true, None)?,
            FieldDefinition::new(
                namespaced_field_name(MANY_MANY_NAMESPACE, "Sort"),
                "Sort order",
                FieldKind::Number,
                false,
                None,
            )?,
        ]);

    Ok(HashMap::from([(
        "Groups".to_owned(),
        DetailFormComponent::new(group_membership, services.clone()),
    )]))
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{record_types, validate_permission_code};

    #[test]
    fn roles_own_codes_and_join_groups() {
        let registry = record_types().unwrap_or_else(|_| unreachable!());

        assert!(registry.relation("PermissionRole", "Codes").is_some());
        assert!(registry.relation("PermissionRole", "Groups").is_some());
        assert!(registry.find("Group").is_some());
        assert!(registry.validator_for("PermissionRole").is_some());
    }

    #[test]
    fn permission_codes_must_be_upper_case() {
        let mut data = Map::new();
        data.insert("Code".to_owned(), json!("CMS_ACCESS"));
        assert!(validate_permission_code(&data).is_ok());

        data.insert("Code".to_owned(), json!("cms access"));
        assert!(validate_permission_code(&data).is_err());

        data.insert("Code".to_owned(), Value::Null);
        assert!(validate_permission_code(&data).is_err());
    }
}
