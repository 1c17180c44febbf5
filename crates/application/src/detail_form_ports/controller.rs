use gridform_core::AppResult;
use gridform_domain::BreadcrumbTrail;
use serde::Serialize;

/// Content handed to a page controller for wrapping into page chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    /// Rendered detail form markup.
    pub content: String,
    /// Page title.
    pub title: String,
    /// Navigation path of the nested item, when the controller has one.
    pub breadcrumbs: Option<BreadcrumbTrail>,
}

/// Page-level controller terminating a chain of nested item handlers.
pub trait PageController: Send + Sync {
    /// Returns the controller's base link.
    fn link(&self) -> String;

    /// Returns an explicit back affordance, if the controller offers one.
    fn back_link(&self) -> Option<String> {
        None
    }

    /// Returns the controller's breadcrumb trail, or `None` when the
    /// controller does not take part in breadcrumb navigation.
    fn breadcrumbs(&self) -> Option<BreadcrumbTrail> {
        None
    }

    /// Returns whether the controller renders admin page chrome.
    fn is_page_chrome(&self) -> bool {
        false
    }

    /// Wraps content into the controller's full page.
    fn customise(&self, content: PageContent) -> AppResult<String>;
}
