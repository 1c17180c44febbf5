use serde::{Deserialize, Serialize};

/// One step of the navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    title: String,
    link: Option<String>,
}

impl Breadcrumb {
    /// Creates a breadcrumb entry. Entries without a link are not navigable.
    #[must_use]
    pub fn new(title: impl Into<String>, link: Option<String>) -> Self {
        Self {
            title: title.into(),
            link,
        }
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the link, if the entry is navigable.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

/// Ordered navigation path, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbTrail {
    items: Vec<Breadcrumb>,
}

impl BreadcrumbTrail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, breadcrumb: Breadcrumb) {
        self.items.push(breadcrumb);
    }

    /// Returns the entries.
    #[must_use]
    pub fn items(&self) -> &[Breadcrumb] {
        &self.items
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the trail is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the tail entry.
    #[must_use]
    pub fn last(&self) -> Option<&Breadcrumb> {
        self.items.last()
    }

    /// Returns the entry one level up from the tail.
    #[must_use]
    pub fn one_level_up(&self) -> Option<&Breadcrumb> {
        self.items
            .len()
            .checked_sub(2)
            .and_then(|index| self.items.get(index))
    }
}

impl From<Vec<Breadcrumb>> for BreadcrumbTrail {
    fn from(items: Vec<Breadcrumb>) -> Self {
        Self { items }
    }
}
