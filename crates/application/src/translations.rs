use std::collections::BTreeMap;

/// Label of the save action on persisted records.
pub const SAVE_LABEL: &str = "DetailForm.Save";
/// Label of the save action on unsaved records.
pub const CREATE_LABEL: &str = "DetailForm.Create";
/// Label of the delete action.
pub const DELETE_LABEL: &str = "DetailForm.Delete";
/// Label of the cancel link.
pub const CANCEL_LABEL: &str = "DetailForm.CancelBtn";
/// Success notice after a save. Parameters: `name`, `link`.
pub const SAVED_MESSAGE: &str = "DetailForm.Saved";
/// Success notice after a delete. Parameters: `name`, `title`.
pub const DELETED_MESSAGE: &str = "DetailForm.Deleted";
/// Failure notice for a delete without permission.
pub const DELETE_PERMISSION_FAILURE: &str = "DetailForm.DeletePermissionsFailure";
/// Breadcrumb title of an unsaved record. Parameters: `name`.
pub const NEW_RECORD_TITLE: &str = "DetailForm.NewRecord";

/// Translation catalog for user-facing detail form strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translations {
    entries: BTreeMap<String, String>,
}

impl Translations {
    /// Returns the English catalog.
    #[must_use]
    pub fn english() -> Self {
        let entries = [
            (SAVE_LABEL, "Save"),
            (CREATE_LABEL, "Create"),
            (DELETE_LABEL, "Delete"),
            (CANCEL_LABEL, "Cancel"),
            (SAVED_MESSAGE, "Saved {name} {link}"),
            (DELETED_MESSAGE, "Deleted {name} {title}"),
            (DELETE_PERMISSION_FAILURE, "No delete permissions"),
            (NEW_RECORD_TITLE, "New {name}"),
        ]
        .into_iter()
        .map(|(key, text)| (key.to_owned(), text.to_owned()))
        .collect();

        Self { entries }
    }

    /// Overrides one entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(key.into(), text.into());
        self
    }

    /// Returns the translated text with `{placeholder}` parameters filled in.
    /// Unknown keys translate to themselves.
    #[must_use]
    pub fn text(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.entries.get(key).map_or(key, String::as_str);
        params
            .iter()
            .fold(template.to_owned(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::{DELETED_MESSAGE, SAVE_LABEL, Translations};

    #[test]
    fn text_fills_placeholders() {
        let translations = Translations::english();
        assert_eq!(
            translations.text(DELETED_MESSAGE, &[("name", "Role"), ("title", "Editors")]),
            "Deleted Role Editors"
        );
    }

    #[test]
    fn overrides_replace_defaults() {
        let translations = Translations::english().with_entry(SAVE_LABEL, "Speichern");
        assert_eq!(translations.text(SAVE_LABEL, &[]), "Speichern");
        assert_eq!(translations.text("Unknown.Key", &[]), "Unknown.Key");
    }
}
