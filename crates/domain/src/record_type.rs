use std::collections::{BTreeMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use gridform_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::Record;

/// Supported form field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    TextArea,
    /// Integer or decimal number.
    Number,
    /// Boolean toggle.
    Checkbox,
    /// Display-only value, never submitted.
    Literal,
}

impl FieldKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextArea => "text_area",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Literal => "literal",
        }
    }

    /// Coerces a submitted value into the stored representation.
    pub fn coerce(&self, field_name: &str, value: &Value) -> AppResult<Value> {
        match (self, value) {
            (Self::Checkbox, Value::Bool(_)) => Ok(value.clone()),
            (Self::Checkbox, Value::String(raw)) => Ok(Value::Bool(matches!(
                raw.trim(),
                "1" | "on" | "true" | "yes"
            ))),
            (Self::Checkbox, Value::Null) => Ok(Value::Bool(false)),
            (Self::Number, Value::Number(_)) => Ok(value.clone()),
            (Self::Number, Value::String(raw)) if raw.trim().is_empty() => Ok(Value::Null),
            (Self::Number, Value::String(raw)) => {
                let trimmed = raw.trim();
                if let Ok(integer) = trimmed.parse::<i64>() {
                    return Ok(Value::from(integer));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        AppError::Validation(format!("'{field_name}' must be a number"))
                    })
            }
            (Self::Text | Self::TextArea, Value::String(_) | Value::Null) => Ok(value.clone()),
            (Self::Text | Self::TextArea, Value::Number(_) | Value::Bool(_)) => {
                Ok(Value::String(value.to_string()))
            }
            _ => Err(AppError::Validation(format!(
                "'{field_name}' does not accept a {} value",
                json_kind(value)
            ))),
        }
    }
}

impl FromStr for FieldKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "text_area" => Ok(Self::TextArea),
            "number" => Ok(Self::Number),
            "checkbox" => Ok(Self::Checkbox),
            "literal" => Ok(Self::Literal),
            _ => Err(AppError::Validation(format!("unknown field kind '{value}'"))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Field definition of a record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    name: NonEmptyString,
    label: NonEmptyString,
    kind: FieldKind,
    required: bool,
    default_value: Option<Value>,
}

impl FieldDefinition {
    /// Creates a validated field definition.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
        required: bool,
        default_value: Option<Value>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if let Some(default_value) = &default_value {
            kind.coerce(name.as_str(), default_value)?;
        }

        Ok(Self {
            name,
            label: NonEmptyString::new(label)?,
            kind,
            required,
            default_value,
        })
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether persistence requires a non-empty value.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the value new records start with.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }
}

/// Relation shapes a record type can own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RelationKind {
    /// Children carry a foreign key pointing at the owner.
    HasMany {
        /// Field on the child holding the owner id.
        foreign_key: String,
        /// Children are removed with their owner.
        cascade_delete: bool,
    },
    /// Membership table with optional per-membership attributes.
    ManyMany {
        /// Attribute names stored on each membership.
        extra_fields: Vec<String>,
    },
}

/// Named relation from one record type to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    name: NonEmptyString,
    target_type: NonEmptyString,
    kind: RelationKind,
}

impl RelationDefinition {
    /// Creates a one-to-many relation.
    pub fn has_many(
        name: impl Into<String>,
        target_type: impl Into<String>,
        foreign_key: impl Into<String>,
        cascade_delete: bool,
    ) -> AppResult<Self> {
        let foreign_key = NonEmptyString::new(foreign_key)?;
        Ok(Self {
            name: NonEmptyString::new(name)?,
            target_type: NonEmptyString::new(target_type)?,
            kind: RelationKind::HasMany {
                foreign_key: foreign_key.into(),
                cascade_delete,
            },
        })
    }

    /// Creates a many-to-many relation.
    pub fn many_many(
        name: impl Into<String>,
        target_type: impl Into<String>,
        extra_fields: Vec<String>,
    ) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for field in &extra_fields {
            if field.trim().is_empty() {
                return Err(AppError::Validation(
                    "many_many extra fields cannot be empty".to_owned(),
                ));
            }
            if !seen.insert(field.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate many_many extra field '{field}'"
                )));
            }
        }

        Ok(Self {
            name: NonEmptyString::new(name)?,
            target_type: NonEmptyString::new(target_type)?,
            kind: RelationKind::ManyMany { extra_fields },
        })
    }

    /// Returns the relation name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the related record type.
    #[must_use]
    pub fn target_type(&self) -> &NonEmptyString {
        &self.target_type
    }

    /// Returns the relation shape.
    #[must_use]
    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }
}

type ValidationFn = dyn Fn(&Map<String, Value>) -> Result<(), String> + Send + Sync;

/// Form validator run against submitted data before a record is written.
#[derive(Clone)]
pub enum Validator {
    /// Listed fields must be present and non-empty.
    RequiredFields(Vec<String>),
    /// Arbitrary check returning a user-facing message on failure.
    Custom(Arc<ValidationFn>),
}

impl Validator {
    /// Validates submitted form data.
    pub fn validate(&self, data: &Map<String, Value>) -> AppResult<()> {
        match self {
            Self::RequiredFields(fields) => {
                let missing: Vec<&str> = fields
                    .iter()
                    .filter(|field| {
                        data.get(field.as_str())
                            .is_none_or(|value| value.is_null() || value.as_str() == Some(""))
                    })
                    .map(String::as_str)
                    .collect();

                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(AppError::Validation(format!(
                        "required fields missing: {}",
                        missing.join(", ")
                    )))
                }
            }
            Self::Custom(check) => check(data).map_err(AppError::Validation),
        }
    }
}

impl Debug for Validator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequiredFields(fields) => formatter
                .debug_tuple("RequiredFields")
                .field(fields)
                .finish(),
            Self::Custom(_) => formatter.write_str("Custom(..)"),
        }
    }
}

/// Record type definition: fields, relations and form defaults.
#[derive(Debug, Clone)]
pub struct RecordTypeDefinition {
    name: NonEmptyString,
    singular_name: NonEmptyString,
    parent_type: Option<NonEmptyString>,
    fields: Vec<FieldDefinition>,
    relations: Vec<RelationDefinition>,
    validator: Option<Validator>,
}

impl RecordTypeDefinition {
    /// Creates a validated record type definition.
    pub fn new(
        name: impl Into<String>,
        singular_name: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name().as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate field '{}' in record type",
                    field.name().as_str()
                )));
            }
        }

        Ok(Self {
            name: NonEmptyString::new(name)?,
            singular_name: NonEmptyString::new(singular_name)?,
            parent_type: None,
            fields,
            relations: Vec::new(),
            validator: None,
        })
    }

    /// Declares this type as a subtype of another registered type.
    pub fn with_parent(mut self, parent_type: impl Into<String>) -> AppResult<Self> {
        self.parent_type = Some(NonEmptyString::new(parent_type)?);
        Ok(self)
    }

    /// Adds a relation.
    pub fn with_relation(mut self, relation: RelationDefinition) -> AppResult<Self> {
        if self
            .relations
            .iter()
            .any(|existing| existing.name() == relation.name())
        {
            return Err(AppError::Validation(format!(
                "duplicate relation '{}' in record type '{}'",
                relation.name(),
                self.name
            )));
        }

        self.relations.push(relation);
        Ok(self)
    }

    /// Sets the validator edit forms adopt when none is configured.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the human-readable singular name.
    #[must_use]
    pub fn singular_name(&self) -> &NonEmptyString {
        &self.singular_name
    }

    /// Returns the parent type, if any.
    #[must_use]
    pub fn parent_type(&self) -> Option<&NonEmptyString> {
        self.parent_type.as_ref()
    }

    /// Returns fields declared directly on this type.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns relations declared directly on this type.
    #[must_use]
    pub fn relations(&self) -> &[RelationDefinition] {
        &self.relations
    }

    /// Returns the validator declared directly on this type.
    #[must_use]
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }
}

/// Registry of known record types.
#[derive(Debug, Clone, Default)]
pub struct RecordTypeRegistry {
    types: BTreeMap<String, RecordTypeDefinition>,
}

impl RecordTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record type. Parent types must be registered first.
    pub fn register(&mut self, definition: RecordTypeDefinition) -> AppResult<()> {
        let name = definition.name().as_str().to_owned();
        if self.types.contains_key(&name) {
            return Err(AppError::Conflict(format!(
                "record type '{name}' is already registered"
            )));
        }

        if let Some(parent) = definition.parent_type()
            && !self.types.contains_key(parent.as_str())
        {
            return Err(AppError::Validation(format!(
                "parent type '{parent}' of '{name}' is not registered"
            )));
        }

        self.types.insert(name, definition);
        Ok(())
    }

    /// Looks up a record type.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&RecordTypeDefinition> {
        self.types.get(name)
    }

    /// Looks up a record type, failing when unknown.
    pub fn require(&self, name: &str) -> AppResult<&RecordTypeDefinition> {
        self.find(name)
            .ok_or_else(|| AppError::NotFound(format!("record type '{name}' is not registered")))
    }

    /// Returns the type followed by its ancestors, nearest first.
    fn lineage<'a>(&'a self, name: &str) -> Vec<&'a RecordTypeDefinition> {
        let mut lineage = Vec::new();
        let mut current = self.find(name);
        while let Some(definition) = current {
            if lineage
                .iter()
                .any(|seen: &&RecordTypeDefinition| seen.name() == definition.name())
            {
                break;
            }
            lineage.push(definition);
            current = definition
                .parent_type()
                .and_then(|parent| self.find(parent.as_str()));
        }
        lineage
    }

    /// Returns whether `name` is `ancestor` or one of its subtypes.
    #[must_use]
    pub fn is_a(&self, name: &str, ancestor: &str) -> bool {
        self.lineage(name)
            .iter()
            .any(|definition| definition.name().as_str() == ancestor)
    }

    /// Returns inherited fields first, then the type's own fields.
    pub fn default_fields(&self, name: &str) -> AppResult<Vec<FieldDefinition>> {
        self.require(name)?;
        let mut fields: Vec<FieldDefinition> = Vec::new();
        for definition in self.lineage(name).into_iter().rev() {
            for field in definition.fields() {
                if let Some(position) = fields
                    .iter()
                    .position(|existing| existing.name() == field.name())
                {
                    fields[position] = field.clone();
                } else {
                    fields.push(field.clone());
                }
            }
        }
        Ok(fields)
    }

    /// Returns the nearest validator in the type's lineage.
    #[must_use]
    pub fn validator_for(&self, name: &str) -> Option<Validator> {
        self.lineage(name)
            .into_iter()
            .find_map(|definition| definition.validator().cloned())
    }

    /// Returns a relation declared on the type or one of its ancestors.
    #[must_use]
    pub fn relation(&self, name: &str, relation_name: &str) -> Option<&RelationDefinition> {
        self.lineage(name).into_iter().find_map(|definition| {
            definition
                .relations()
                .iter()
                .find(|relation| relation.name().as_str() == relation_name)
        })
    }

    /// Returns the singular display name, or the type name when unknown.
    #[must_use]
    pub fn singular_name(&self, name: &str) -> String {
        self.find(name)
            .map(|definition| definition.singular_name().as_str().to_owned())
            .unwrap_or_else(|| name.to_owned())
    }

    /// Creates an unsaved record with field defaults applied.
    pub fn instantiate(&self, name: &str) -> AppResult<Record> {
        let mut record = Record::new(name)?;
        for field in self.default_fields(name)? {
            if let Some(default_value) = field.default_value() {
                record.insert_default(field.name().as_str(), default_value.clone());
            }
        }
        Ok(record)
    }
}
