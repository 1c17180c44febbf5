use std::collections::BTreeMap;
use std::sync::Arc;

use gridform_core::{AppError, AppResult, UserIdentity};
use serde_json::{Map, Value};

use crate::detail_form_ports::FormMessageStore;

/// Submitted field naming the save action.
pub const SAVE_ACTION_FIELD: &str = "action_doSave";

/// Submitted field naming the delete action.
pub const DELETE_ACTION_FIELD: &str = "action_doDelete";

/// Inbound item request state shared by every handler in a chain.
#[derive(Clone)]
pub struct ItemRequest {
    actor: UserIdentity,
    is_fragment: bool,
    requested_fragments: Vec<String>,
    referer: Option<String>,
    messages: Arc<dyn FormMessageStore>,
}

impl ItemRequest {
    /// Creates a full-page request.
    #[must_use]
    pub fn new(actor: UserIdentity, messages: Arc<dyn FormMessageStore>) -> Self {
        Self {
            actor,
            is_fragment: false,
            requested_fragments: Vec::new(),
            referer: None,
            messages,
        }
    }

    /// Marks the request as a fragment request naming the fragments it wants.
    #[must_use]
    pub fn as_fragment(mut self, requested_fragments: impl IntoIterator<Item = String>) -> Self {
        self.is_fragment = true;
        self.requested_fragments = requested_fragments
            .into_iter()
            .map(|fragment| fragment.trim().to_owned())
            .filter(|fragment| !fragment.is_empty())
            .collect();
        self
    }

    /// Sets the page the request came from.
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Returns the acting user.
    #[must_use]
    pub fn actor(&self) -> &UserIdentity {
        &self.actor
    }

    /// Returns whether partial content was requested.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.is_fragment
    }

    /// Returns the named fragments the client asked for.
    #[must_use]
    pub fn requested_fragments(&self) -> &[String] {
        &self.requested_fragments
    }

    /// Returns the referring page.
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Returns the session message store.
    #[must_use]
    pub fn messages(&self) -> &Arc<dyn FormMessageStore> {
        &self.messages
    }
}

/// Action an item request dispatches to.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemAction {
    /// Read-only view.
    View,
    /// Edit form.
    Edit,
    /// Form submission of the save action.
    Save(Map<String, Value>),
    /// Form submission of the delete action.
    Delete,
}

impl ItemAction {
    /// Maps a trailing URL segment to a rendering action.
    pub fn from_segment(segment: Option<&str>) -> AppResult<Self> {
        match segment {
            None | Some("" | "edit") => Ok(Self::Edit),
            Some("view") => Ok(Self::View),
            Some(other) => Err(AppError::NotFound(format!(
                "item action '{other}' does not exist"
            ))),
        }
    }

    /// Maps submitted form data to the submitted action.
    pub fn from_submission(data: Map<String, Value>) -> AppResult<Self> {
        if data.contains_key(DELETE_ACTION_FIELD) {
            return Ok(Self::Delete);
        }
        if data.contains_key(SAVE_ACTION_FIELD) {
            return Ok(Self::Save(data));
        }

        Err(AppError::Validation(
            "form submission does not name an action".to_owned(),
        ))
    }
}

/// Outcome of an item request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResponse {
    /// Markup, optionally naming the fragment it replaces.
    Content {
        /// Rendered markup.
        body: String,
        /// Fragment the markup targets.
        fragment: Option<String>,
    },
    /// Several named fragments at once.
    Fragments(BTreeMap<String, String>),
    /// Redirect, optionally hinting which fragment to refresh.
    Redirect {
        /// Target location.
        location: String,
        /// Fragment the client should refresh after following.
        refresh_fragment: Option<String>,
    },
}

impl ItemResponse {
    /// Creates a plain redirect.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            refresh_fragment: None,
        }
    }

    /// Creates a redirect with a fragment refresh hint.
    #[must_use]
    pub fn redirect_refreshing(location: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            refresh_fragment: Some(fragment.into()),
        }
    }

    /// Returns the redirect target, if this is a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location, .. } => Some(location.as_str()),
            _ => None,
        }
    }
}
