use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use gridform_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Submitted field carrying the concrete record type.
pub const RECORD_TYPE_FIELD: &str = "RecordType";

/// Field exposing the record identity to forms.
pub const ID_FIELD: &str = "ID";

/// Field used as the human-readable record title.
pub const TITLE_FIELD: &str = "Title";

/// Identity of a persisted record. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a validated record identifier.
    pub fn new(value: u64) -> AppResult<Self> {
        if value == 0 {
            return Err(AppError::Validation(
                "record id must be greater than zero".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Parses a URL segment. Only positive integers are identifiers.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        segment
            .parse::<u64>()
            .ok()
            .and_then(|value| Self::new(value).ok())
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Returns the id as a JSON value, matching how foreign keys are stored.
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::from(self.0)
    }

    /// Reads an id back from a stored JSON field value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_u64().and_then(|raw| Self::new(raw).ok()),
            Value::String(raw) => Self::parse(raw.trim()),
            _ => None,
        }
    }
}

impl Display for RecordId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A single entity, persisted or not yet written.
///
/// The record type is the concrete type tag and may be a subtype of the
/// element type declared by the collection the record is edited from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: Option<RecordId>,
    record_type: NonEmptyString,
    fields: Map<String, Value>,
    #[serde(skip)]
    changed: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an unsaved record of the given type.
    pub fn new(record_type: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id: None,
            record_type: NonEmptyString::new(record_type)?,
            fields: Map::new(),
            changed: BTreeMap::new(),
        })
    }

    /// Rehydrates a persisted record.
    pub fn persisted(
        id: RecordId,
        record_type: impl Into<String>,
        fields: Map<String, Value>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: Some(id),
            record_type: NonEmptyString::new(record_type)?,
            fields,
            changed: BTreeMap::new(),
        })
    }

    /// Returns the identity, absent while unsaved.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns whether the record has never been written.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Returns the concrete record type.
    #[must_use]
    pub fn record_type(&self) -> &NonEmptyString {
        &self.record_type
    }

    /// Returns stored field values.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns one field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns whether the field has been set on this record.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Sets a field value and tracks the original value on first change.
    ///
    /// Identity and type tag are not plain fields and are ignored here.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if name == RECORD_TYPE_FIELD || name == ID_FIELD {
            return;
        }

        let previous = self.fields.get(&name).cloned().unwrap_or(Value::Null);
        if previous == value {
            return;
        }

        self.changed.entry(name.clone()).or_insert(previous);
        self.fields.insert(name, value);
    }

    /// Removes a transient field, such as a namespaced relation value, before
    /// the record is written.
    pub fn take_field(&mut self, name: &str) -> Option<Value> {
        self.changed.remove(name);
        self.fields.remove(name)
    }

    /// Seeds a field without recording a change.
    pub(crate) fn insert_default(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_owned(), value);
    }

    /// Returns the title field when it holds a non-empty string.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields
            .get(TITLE_FIELD)
            .and_then(Value::as_str)
            .filter(|title| !title.trim().is_empty())
    }

    /// Returns the title, falling back to `#<id>` for persisted records.
    #[must_use]
    pub fn display_title(&self) -> String {
        match (self.title(), self.id) {
            (Some(title), _) => title.to_owned(),
            (None, Some(id)) => format!("#{id}"),
            (None, None) => String::new(),
        }
    }

    /// Returns original values of fields changed since load, keyed by field.
    #[must_use]
    pub fn changed_fields(&self) -> &BTreeMap<String, Value> {
        &self.changed
    }

    /// Returns whether the type tag changed since load.
    #[must_use]
    pub fn type_changed(&self) -> bool {
        self.changed.contains_key(RECORD_TYPE_FIELD)
    }

    /// Values exposed to forms: stored fields plus identity and type tag.
    #[must_use]
    pub fn form_values(&self) -> Map<String, Value> {
        let mut values = self.fields.clone();
        values.insert(
            ID_FIELD.to_owned(),
            self.id.map(RecordId::to_value).unwrap_or(Value::from(0)),
        );
        values.insert(
            RECORD_TYPE_FIELD.to_owned(),
            Value::String(self.record_type.as_str().to_owned()),
        );
        values
    }

    /// Re-materialises the record as another concrete type.
    ///
    /// The previous type is recorded as the original type tag value first, so
    /// change tracking sees the transition even when fields are applied later.
    pub fn into_type(self, record_type: impl Into<String>) -> AppResult<Self> {
        let record_type = NonEmptyString::new(record_type)?;
        if record_type == self.record_type {
            return Ok(self);
        }

        let mut changed = self.changed;
        changed
            .entry(RECORD_TYPE_FIELD.to_owned())
            .or_insert(Value::String(self.record_type.into()));

        Ok(Self {
            id: self.id,
            record_type,
            fields: self.fields,
            changed,
        })
    }

    /// Returns the record as written under the given identity, with change
    /// tracking reset.
    #[must_use]
    pub fn into_written(self, id: RecordId) -> Self {
        Self {
            id: Some(id),
            record_type: self.record_type,
            fields: self.fields,
            changed: BTreeMap::new(),
        }
    }
}

/// Returns whether a value counts as empty for merge purposes.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|raw| raw == 0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}
