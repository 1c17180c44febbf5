use std::sync::Arc;

use gridform_application::{
    DetailFormComponent, PAGE_FORM_NAME, PageContent, PageController, TemplateRenderer,
    join_links,
};
use gridform_core::{AppError, AppResult, NonEmptyString};
use gridform_domain::{Breadcrumb, BreadcrumbTrail, Collection};
use gridform_infrastructure::ADMIN_LAYOUT_TEMPLATE;
use serde::Serialize;

/// Collection listed on an admin section, with the component editing its
/// records.
#[derive(Clone)]
pub struct HostedCollection {
    title: String,
    collection: Collection,
    component: DetailFormComponent,
}

impl HostedCollection {
    pub fn new(
        title: impl Into<String>,
        collection: Collection,
        component: DetailFormComponent,
    ) -> Self {
        Self {
            title: title.into(),
            collection,
            component,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn component(&self) -> &DetailFormComponent {
        &self.component
    }
}

/// Admin screen at `/admin/<name>` hosting collections in its `EditForm`.
pub struct AdminSection {
    name: NonEmptyString,
    title: String,
    collections: Vec<HostedCollection>,
}

impl AdminSection {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if name.as_str().contains('/') {
            return Err(AppError::Validation(format!(
                "section name '{}' must be a single path segment",
                name.as_str()
            )));
        }

        Ok(Self {
            name,
            title: title.into(),
            collections: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_collection(mut self, collection: HostedCollection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn link(&self) -> String {
        join_links(["/admin", self.name.as_str()])
    }

    /// Link of the section's page form. Keys notices shown on the listing.
    pub fn form_link(&self) -> String {
        join_links([self.link().as_str(), PAGE_FORM_NAME])
    }

    pub fn collections(&self) -> &[HostedCollection] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&HostedCollection> {
        self.collections
            .iter()
            .find(|hosted| hosted.collection().name().as_str() == name)
    }
}

#[derive(Serialize)]
struct LayoutView<'a> {
    title: &'a str,
    content: &'a str,
    breadcrumbs: Option<&'a BreadcrumbTrail>,
    section_title: &'a str,
    section_link: &'a str,
}

/// Page chrome controller of an admin section.
pub struct AdminPageController {
    section: Arc<AdminSection>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl AdminPageController {
    pub fn new(section: Arc<AdminSection>, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { section, renderer }
    }
}

impl PageController for AdminPageController {
    fn link(&self) -> String {
        self.section.link()
    }

    fn breadcrumbs(&self) -> Option<BreadcrumbTrail> {
        Some(BreadcrumbTrail::from(vec![Breadcrumb::new(
            self.section.title(),
            Some(self.section.link()),
        )]))
    }

    fn is_page_chrome(&self) -> bool {
        true
    }

    fn customise(&self, content: PageContent) -> AppResult<String> {
        let section_link = self.section.link();
        let context = serde_json::to_value(LayoutView {
            title: content.title.as_str(),
            content: content.content.as_str(),
            breadcrumbs: content.breadcrumbs.as_ref(),
            section_title: self.section.title(),
            section_link: section_link.as_str(),
        })
        .map_err(|error| AppError::Internal(format!("failed to serialize page layout: {error}")))?;

        self.renderer.render(ADMIN_LAYOUT_TEMPLATE, &context)
    }
}
