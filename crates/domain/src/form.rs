use gridform_core::AppResult;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::record::{Record, is_falsy};
use crate::record_type::{FieldDefinition, FieldKind, Validator};

/// Namespace many-to-many extra fields are loaded under.
pub const MANY_MANY_NAMESPACE: &str = "ManyMany";

/// Returns the form field name for a namespaced key, e.g. `ManyMany[Sort]`.
#[must_use]
pub fn namespaced_field_name(namespace: &str, key: &str) -> String {
    format!("{namespace}[{key}]")
}

fn split_namespaced(name: &str) -> Option<(&str, &str)> {
    let (namespace, rest) = name.split_once('[')?;
    let key = rest.strip_suffix(']')?;
    (!namespace.is_empty() && !key.is_empty()).then_some((namespace, key))
}

/// Escapes text for inclusion in HTML markup.
#[must_use]
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// How loaded values combine with values already on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Every present key overwrites the field value.
    Default,
    /// Empty values (null, false, 0, "") never overwrite.
    IgnoreFalsy,
}

/// One input on a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    name: String,
    label: String,
    kind: FieldKind,
    value: Value,
    read_only: bool,
}

impl FormField {
    /// Creates an empty field.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            value: Value::Null,
            read_only: kind == FieldKind::Literal,
        }
    }

    /// Creates the form input for a record type field.
    #[must_use]
    pub fn from_definition(definition: &FieldDefinition) -> Self {
        let mut field = Self::new(
            definition.name().as_str(),
            definition.label().as_str(),
            definition.kind(),
        );
        if let Some(default_value) = definition.default_value() {
            field.value = default_value.clone();
        }
        field
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Sets the current value.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Returns whether the field rejects input.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Sets the read-only flag.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

/// Kind of a form action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FormActionKind {
    /// Submit button dispatching to a handler method.
    Submit,
    /// Button-like link.
    Link {
        /// Link target.
        href: String,
    },
}

/// Button or link rendered below the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormAction {
    name: String,
    label: String,
    kind: FormActionKind,
    read_only: bool,
    extra_classes: Vec<String>,
}

impl FormAction {
    /// Creates a submit action. The field name is `action_<method>`.
    #[must_use]
    pub fn submit(method: &str, label: impl Into<String>) -> Self {
        Self {
            name: format!("action_{method}"),
            label: label.into(),
            kind: FormActionKind::Submit,
            read_only: false,
            extra_classes: Vec::new(),
        }
    }

    /// Creates a button-like link.
    #[must_use]
    pub fn link(name: impl Into<String>, label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FormActionKind::Link { href: href.into() },
            read_only: false,
            extra_classes: Vec::new(),
        }
    }

    /// Adds a CSS class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.extra_classes.push(class.into());
        self
    }

    /// Returns the action field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the action kind.
    #[must_use]
    pub fn kind(&self) -> &FormActionKind {
        &self.kind
    }

    /// Returns whether the action is disabled.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Sets the disabled flag.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

/// Tone of a form message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTone {
    /// Success notice.
    Good,
    /// Failure notice.
    Bad,
}

/// Message shown above a form. The body is HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct FormMessage {
    html: String,
    tone: MessageTone,
}

impl FormMessage {
    /// Creates a message from plain text, escaping it.
    #[must_use]
    pub fn text(text: &str, tone: MessageTone) -> Self {
        Self {
            html: html_escape(text),
            tone,
        }
    }

    /// Creates a message from trusted HTML.
    #[must_use]
    pub fn html(html: impl Into<String>, tone: MessageTone) -> Self {
        Self {
            html: html.into(),
            tone,
        }
    }

    /// Returns the HTML body.
    #[must_use]
    pub fn as_html(&self) -> &str {
        self.html.as_str()
    }

    /// Returns the tone.
    #[must_use]
    pub fn tone(&self) -> MessageTone {
        self.tone
    }
}

/// Assembled edit form for one record.
#[derive(Debug, Clone, Serialize)]
pub struct FormSpec {
    name: String,
    fields: Vec<FormField>,
    actions: Vec<FormAction>,
    read_only: bool,
    message: Option<FormMessage>,
    back_link: Option<String>,
    action_url: Option<String>,
    fragments: Vec<String>,
    extra_classes: Vec<String>,
    #[serde(skip)]
    validator: Option<Validator>,
}

impl FormSpec {
    /// Creates a form.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FormField>,
        actions: Vec<FormAction>,
        validator: Option<Validator>,
    ) -> Self {
        Self {
            name: name.into(),
            fields,
            actions,
            read_only: false,
            message: None,
            back_link: None,
            action_url: None,
            fragments: Vec::new(),
            extra_classes: Vec::new(),
            validator,
        }
    }

    /// Returns the form name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Returns one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns one field for mutation.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|field| field.name() == name)
    }

    /// Appends a field.
    pub fn push_field(&mut self, field: FormField) {
        self.fields.push(field);
    }

    /// Forces one field read-only. Returns whether the field exists.
    pub fn make_field_read_only(&mut self, name: &str) -> bool {
        match self.field_mut(name) {
            Some(field) => {
                field.set_read_only(true);
                true
            }
            None => false,
        }
    }

    /// Returns the actions.
    #[must_use]
    pub fn actions(&self) -> &[FormAction] {
        &self.actions
    }

    /// Returns one action.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&FormAction> {
        self.actions.iter().find(|action| action.name() == name)
    }

    /// Returns one action for mutation.
    pub fn action_mut(&mut self, name: &str) -> Option<&mut FormAction> {
        self.actions.iter_mut().find(|action| action.name() == name)
    }

    /// Disables every field and action.
    pub fn make_read_only(&mut self) {
        self.read_only = true;
        for field in &mut self.fields {
            field.set_read_only(true);
        }
        for action in &mut self.actions {
            action.set_read_only(true);
        }
    }

    /// Returns whether the whole form was made read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Loads values into matching fields.
    ///
    /// Field names of the form `Namespace[key]` read from a nested object
    /// under `Namespace` when no flat key of that name exists.
    pub fn load_data(&mut self, data: &Map<String, Value>, strategy: MergeStrategy) {
        for field in &mut self.fields {
            let value = data.get(field.name()).or_else(|| {
                split_namespaced(field.name()).and_then(|(namespace, key)| {
                    data.get(namespace)
                        .and_then(Value::as_object)
                        .and_then(|nested| nested.get(key))
                })
            });

            let Some(value) = value else {
                continue;
            };
            if strategy == MergeStrategy::IgnoreFalsy && is_falsy(value) {
                continue;
            }
            field.set_value(value.clone());
        }
    }

    /// Runs the validator against submitted data.
    pub fn validate(&self, submitted: &Map<String, Value>) -> AppResult<()> {
        match &self.validator {
            Some(validator) => validator.validate(submitted),
            None => Ok(()),
        }
    }

    /// Returns the validator.
    #[must_use]
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Copies submitted values of editable fields into a record.
    ///
    /// Unchecked checkboxes are absent from submissions and save `false`;
    /// other missing fields keep their current value.
    pub fn save_into(&self, record: &mut Record, submitted: &Map<String, Value>) -> AppResult<()> {
        for field in &self.fields {
            if field.is_read_only() || field.kind() == FieldKind::Literal {
                continue;
            }

            match submitted.get(field.name()) {
                Some(value) => {
                    let coerced = field.kind().coerce(field.name(), value)?;
                    record.set_field(field.name(), coerced);
                }
                None if field.kind() == FieldKind::Checkbox => {
                    record.set_field(field.name(), Value::Bool(false));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> Option<&FormMessage> {
        self.message.as_ref()
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: FormMessage) {
        self.message = Some(message);
    }

    /// Returns the back link shown with the form.
    #[must_use]
    pub fn back_link(&self) -> Option<&str> {
        self.back_link.as_deref()
    }

    /// Sets the back link.
    pub fn set_back_link(&mut self, back_link: impl Into<String>) {
        self.back_link = Some(back_link.into());
    }

    /// Returns the submission URL.
    #[must_use]
    pub fn action_url(&self) -> Option<&str> {
        self.action_url.as_deref()
    }

    /// Sets the submission URL.
    pub fn set_action_url(&mut self, action_url: impl Into<String>) {
        self.action_url = Some(action_url.into());
    }

    /// Returns the fragment names this form can refresh.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Tags the form with a refreshable fragment name.
    pub fn add_fragment(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Adds a CSS class.
    pub fn add_extra_class(&mut self, class: impl Into<String>) {
        self.extra_classes.push(class.into());
    }

    /// Returns extra CSS classes.
    #[must_use]
    pub fn extra_classes(&self) -> &[String] {
        &self.extra_classes
    }
}
