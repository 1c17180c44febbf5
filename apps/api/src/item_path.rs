use gridform_application::ITEM_FORM_NAME;
use gridform_core::{AppError, AppResult};

/// One `field/<collection>/item/<id>` step of a nested item URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStep {
    pub collection: String,
    pub id_segment: Option<String>,
}

/// What the URL asks of the innermost item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemTail {
    /// No trailing segment.
    Default,
    /// Named action such as `edit`, `view` or `breadcrumbs`.
    Action(String),
    /// The item's edit form, the target of submissions.
    Form,
}

/// Parsed path below `/admin/<section>/EditForm/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPath {
    pub steps: Vec<ItemStep>,
    pub tail: ItemTail,
}

impl ItemPath {
    /// Parses `field/<c>/item/<id>[/ItemEditForm/field/<c>/item/<id>]*[/<action>]`.
    ///
    /// An id of `new` or an empty id means an unsaved record.
    pub fn parse(path: &str) -> AppResult<Self> {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        let mut remaining = segments.as_slice();
        let mut steps = Vec::new();

        loop {
            let [field, collection, rest @ ..] = remaining else {
                return Err(malformed(path));
            };
            if *field != "field" {
                return Err(malformed(path));
            }

            let (id_segment, rest) = match rest {
                ["item", id, rest @ ..] => (Some(*id), rest),
                ["item"] => (None, &[][..]),
                _ => return Err(malformed(path)),
            };
            steps.push(ItemStep {
                collection: (*collection).to_owned(),
                id_segment: id_segment
                    .filter(|id| *id != "new")
                    .map(ToOwned::to_owned),
            });

            match rest {
                [] => {
                    return Ok(Self {
                        steps,
                        tail: ItemTail::Default,
                    });
                }
                [form] if *form == ITEM_FORM_NAME => {
                    return Ok(Self {
                        steps,
                        tail: ItemTail::Form,
                    });
                }
                [form, nested @ ..] if *form == ITEM_FORM_NAME => remaining = nested,
                [action] => {
                    return Ok(Self {
                        steps,
                        tail: ItemTail::Action((*action).to_owned()),
                    });
                }
                _ => return Err(malformed(path)),
            }
        }
    }

    /// Returns the innermost step.
    pub fn innermost(&self) -> Option<&ItemStep> {
        self.steps.last()
    }
}

fn malformed(path: &str) -> AppError {
    AppError::NotFound(format!("no item route matches '{path}'"))
}
