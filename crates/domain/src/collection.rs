use gridform_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{Record, RecordId};
use crate::record_type::{RelationDefinition, RelationKind};

/// Shape of a collection a detail form edits records from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CollectionKind {
    /// Plain set of records of one type, optionally filtered.
    Filtered,
    /// One-to-many relation bound to an owning record.
    HasMany {
        /// Field on members holding the owner id.
        foreign_key: String,
        /// Bound owner id.
        foreign_id: RecordId,
    },
    /// Many-to-many relation with per-membership attributes.
    ManyMany {
        /// Relation name on the owner type.
        relation_name: String,
        /// Bound owner id.
        owner_id: RecordId,
        /// Attribute names stored per membership.
        extra_fields: Vec<String>,
    },
}

/// Exact-match filter applied to collection members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFilter {
    /// Field name to compare.
    pub field_name: String,
    /// Expected value (exact JSON equality).
    pub value: Value,
}

/// Container of records of one element type, reachable from a hosting screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    name: NonEmptyString,
    element_type: NonEmptyString,
    kind: CollectionKind,
    filters: Vec<CollectionFilter>,
}

impl Collection {
    /// Creates a plain filtered collection.
    pub fn filtered(
        name: impl Into<String>,
        element_type: impl Into<String>,
        filters: Vec<CollectionFilter>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            element_type: NonEmptyString::new(element_type)?,
            kind: CollectionKind::Filtered,
            filters,
        })
    }

    /// Creates a one-to-many collection bound to `foreign_id`.
    pub fn has_many(
        name: impl Into<String>,
        element_type: impl Into<String>,
        foreign_key: impl Into<String>,
        foreign_id: RecordId,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            element_type: NonEmptyString::new(element_type)?,
            kind: CollectionKind::HasMany {
                foreign_key: NonEmptyString::new(foreign_key)?.into(),
                foreign_id,
            },
            filters: Vec::new(),
        })
    }

    /// Creates a many-to-many collection owned by `owner_id`.
    pub fn many_many(
        name: impl Into<String>,
        element_type: impl Into<String>,
        owner_id: RecordId,
        extra_fields: Vec<String>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        Ok(Self {
            element_type: NonEmptyString::new(element_type)?,
            kind: CollectionKind::ManyMany {
                relation_name: name.as_str().to_owned(),
                owner_id,
                extra_fields,
            },
            name,
            filters: Vec::new(),
        })
    }

    /// Builds the collection a relation exposes on a persisted owner.
    pub fn for_relation(owner: &Record, relation: &RelationDefinition) -> AppResult<Self> {
        let owner_id = owner.id().ok_or_else(|| {
            AppError::Validation(format!(
                "relation '{}' is only available on saved records",
                relation.name()
            ))
        })?;

        match relation.kind() {
            RelationKind::HasMany { foreign_key, .. } => Self::has_many(
                relation.name().as_str(),
                relation.target_type().as_str(),
                foreign_key.as_str(),
                owner_id,
            ),
            RelationKind::ManyMany { extra_fields } => Self::many_many(
                relation.name().as_str(),
                relation.target_type().as_str(),
                owner_id,
                extra_fields.clone(),
            ),
        }
    }

    /// Returns the collection name, used as its URL segment.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the declared element type.
    #[must_use]
    pub fn element_type(&self) -> &NonEmptyString {
        &self.element_type
    }

    /// Returns the collection shape.
    #[must_use]
    pub fn kind(&self) -> &CollectionKind {
        &self.kind
    }

    /// Returns exact-match filters.
    #[must_use]
    pub fn filters(&self) -> &[CollectionFilter] {
        &self.filters
    }

    /// Returns the foreign key binding of a one-to-many collection.
    #[must_use]
    pub fn foreign_key(&self) -> Option<(&str, RecordId)> {
        match &self.kind {
            CollectionKind::HasMany {
                foreign_key,
                foreign_id,
            } => Some((foreign_key.as_str(), *foreign_id)),
            _ => None,
        }
    }

    /// Returns per-membership attribute names of a many-to-many collection.
    #[must_use]
    pub fn extra_fields(&self) -> &[String] {
        match &self.kind {
            CollectionKind::ManyMany { extra_fields, .. } => extra_fields.as_slice(),
            _ => &[],
        }
    }

    /// Returns whether this is a many-to-many relation.
    #[must_use]
    pub fn is_many_many(&self) -> bool {
        matches!(self.kind, CollectionKind::ManyMany { .. })
    }

    /// Checks the field-level membership rules: filters and foreign key.
    ///
    /// Type membership and many-to-many membership are the store's concern.
    #[must_use]
    pub fn matches_fields(&self, record: &Record) -> bool {
        let filters_match = self
            .filters
            .iter()
            .all(|filter| record.field(filter.field_name.as_str()) == Some(&filter.value));

        let foreign_key_matches = self.foreign_key().is_none_or(|(foreign_key, foreign_id)| {
            record.field(foreign_key).and_then(RecordId::from_value) == Some(foreign_id)
        });

        filters_match && foreign_key_matches
    }
}
