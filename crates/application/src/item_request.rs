mod delete;
mod save;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use gridform_core::{AppError, AppResult};
use gridform_domain::{
    Breadcrumb, BreadcrumbTrail, Collection, FormSpec, Record, RecordCapabilities,
    RecordPermission,
};
use serde::Serialize;
use tracing::debug;

use crate::content_negotiator::ContentNegotiator;
use crate::detail_form::{DEFAULT_TEMPLATE, DetailFormComponent, ItemRequestKind};
use crate::detail_form_ports::{PageContent, PageController};
use crate::item_exchange::{ItemAction, ItemRequest, ItemResponse};
use crate::links::join_links;
use crate::permission_gate::PermissionGate;
use crate::translations::NEW_RECORD_TITLE;

/// Form name of the page-level form hosting top-level collections.
pub const PAGE_FORM_NAME: &str = "EditForm";

/// Form name of the per-record edit form.
pub const ITEM_FORM_NAME: &str = "ItemEditForm";

/// Template rendering the edit form alone.
pub const ITEM_FORM_TEMPLATE: &str = "ItemEditForm";

/// Handler enclosing an item request: either a page-level controller or
/// another item request one nesting level up.
#[derive(Clone)]
pub enum EnclosingHandler {
    /// Page-level controller terminating the chain.
    Controller(Arc<dyn PageController>),
    /// Item request of an enclosing record.
    Item(Arc<ItemRequestHandler>),
}

impl EnclosingHandler {
    /// Returns the link of the page showing the hosted collection.
    #[must_use]
    pub fn link(&self) -> String {
        match self {
            Self::Controller(controller) => controller.link(),
            Self::Item(handler) => handler.link(None),
        }
    }

    /// Returns the link of the form the hosted collection is a field of.
    #[must_use]
    pub fn form_link(&self) -> String {
        match self {
            Self::Controller(controller) => join_links([controller.link().as_str(), PAGE_FORM_NAME]),
            Self::Item(handler) => handler.form_link(),
        }
    }

    /// Returns the breadcrumb trail, when the handler supports breadcrumbs.
    #[must_use]
    pub fn breadcrumbs(&self) -> Option<BreadcrumbTrail> {
        match self {
            Self::Controller(controller) => controller.breadcrumbs(),
            Self::Item(handler) => handler.breadcrumbs(),
        }
    }

    /// Returns whether this is a page-chrome controller.
    #[must_use]
    pub fn is_page_chrome(&self) -> bool {
        match self {
            Self::Controller(controller) => controller.is_page_chrome(),
            Self::Item(_) => false,
        }
    }
}

/// Template data of the detail form view.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetailFormView<'a> {
    backlink: &'a str,
    item_edit_form: &'a FormSpec,
    title: &'a str,
    breadcrumbs: Option<&'a BreadcrumbTrail>,
}

/// Request handler for one record of a collection.
///
/// Created per request by [`DetailFormComponent::create_handler`] and
/// discarded once the response is produced.
#[derive(Clone)]
pub struct ItemRequestHandler {
    component: DetailFormComponent,
    kind: Arc<dyn ItemRequestKind>,
    collection: Collection,
    record: Record,
    parent: EnclosingHandler,
    template: String,
}

impl ItemRequestHandler {
    pub(crate) fn new(
        component: DetailFormComponent,
        kind: Arc<dyn ItemRequestKind>,
        collection: Collection,
        record: Record,
        parent: EnclosingHandler,
    ) -> Self {
        Self {
            component,
            kind,
            collection,
            record,
            parent,
            template: DEFAULT_TEMPLATE.to_owned(),
        }
    }

    /// Returns the component that created this handler.
    #[must_use]
    pub fn component(&self) -> &DetailFormComponent {
        &self.component
    }

    /// Returns the handler kind.
    #[must_use]
    pub fn kind(&self) -> &Arc<dyn ItemRequestKind> {
        &self.kind
    }

    /// Returns the owning collection.
    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Returns the record this request is about.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Returns the enclosing handler.
    #[must_use]
    pub fn parent(&self) -> &EnclosingHandler {
        &self.parent
    }

    /// Returns the template rendering the detail view.
    #[must_use]
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    /// Replaces the template rendering the detail view.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
    }

    pub(crate) fn with_record(&self, record: Record) -> Self {
        Self {
            record,
            ..self.clone()
        }
    }

    /// Returns the link of the collection inside its hosting form.
    #[must_use]
    pub fn collection_link(&self) -> String {
        join_links([
            self.parent.form_link().as_str(),
            "field",
            self.collection.name().as_str(),
        ])
    }

    /// Returns the canonical link of the record, `new` while unsaved, with an
    /// optional trailing action.
    #[must_use]
    pub fn link(&self, action: Option<&str>) -> String {
        let id = self
            .record
            .id()
            .map_or_else(|| "new".to_owned(), |id| id.to_string());
        join_links([
            self.collection_link().as_str(),
            "item",
            id.as_str(),
            action.unwrap_or_default(),
        ])
    }

    /// Returns the link the edit form submits to. Also keys form messages.
    #[must_use]
    pub fn form_link(&self) -> String {
        self.link(Some(ITEM_FORM_NAME))
    }

    /// Returns the page-level controller found by walking up the chain of
    /// enclosing item requests.
    #[must_use]
    pub fn toplevel_controller(&self) -> Arc<dyn PageController> {
        let mut current = &self.parent;
        loop {
            match current {
                EnclosingHandler::Controller(controller) => return Arc::clone(controller),
                EnclosingHandler::Item(handler) => current = &handler.parent,
            }
        }
    }

    /// Returns the link one navigation level up.
    ///
    /// Prefers the top-level controller's own back affordance, then the tail
    /// of the enclosing handler's breadcrumbs, then the controller link.
    #[must_use]
    pub fn back_link(&self) -> String {
        let controller = self.toplevel_controller();
        controller
            .back_link()
            .or_else(|| {
                self.parent.breadcrumbs().and_then(|trail| {
                    trail
                        .last()
                        .and_then(Breadcrumb::link)
                        .map(str::to_owned)
                })
            })
            .unwrap_or_else(|| controller.link())
    }

    /// Title of the record in navigation: its title, `#<id>`, or `New <type>`.
    #[must_use]
    pub fn record_title(&self) -> String {
        if self.record.is_new() {
            let singular_name = self.singular_name();
            return self
                .component
                .services()
                .translations()
                .text(NEW_RECORD_TITLE, &[("name", singular_name.as_str())]);
        }

        self.record.display_title()
    }

    /// Returns the enclosing trail plus this record, or `None` when the
    /// enclosing handler does not support breadcrumbs.
    #[must_use]
    pub fn breadcrumbs(&self) -> Option<BreadcrumbTrail> {
        let mut trail = self.parent.breadcrumbs()?;
        let link = (!self.record.is_new()).then(|| self.link(None));
        trail.push(Breadcrumb::new(self.record_title(), link));
        Some(trail)
    }

    /// Dispatches an action.
    pub async fn handle(&self, action: ItemAction, request: &ItemRequest) -> AppResult<ItemResponse> {
        match action {
            ItemAction::View => self.view(request).await,
            ItemAction::Edit => self.edit(request).await,
            ItemAction::Save(submitted) => self.do_save(&submitted, request).await,
            ItemAction::Delete => self.do_delete(request).await,
        }
    }

    /// Renders the record read-only. Requires view capability.
    pub async fn view(&self, request: &ItemRequest) -> AppResult<ItemResponse> {
        let record = self.prepared_record();
        let capabilities = self.capabilities(&record, request).await?;
        PermissionGate::require(capabilities, RecordPermission::View, &record)?;

        let mut form = self.item_edit_form(&record, capabilities).await?;
        form.make_read_only();

        let back_link = self.toplevel_controller().link();
        self.render(form, &back_link, request).await
    }

    /// Renders the edit form, read-only where capabilities demand it.
    pub async fn edit(&self, request: &ItemRequest) -> AppResult<ItemResponse> {
        let record = self.prepared_record();
        let capabilities = self.capabilities(&record, request).await?;
        let form = self.item_edit_form(&record, capabilities).await?;

        let controller = self.toplevel_controller();
        let back_link = controller.back_link().unwrap_or_else(|| controller.link());
        self.render(form, &back_link, request).await
    }

    /// Builds the edit form for a prepared record.
    pub async fn item_edit_form(
        &self,
        record: &Record,
        capabilities: RecordCapabilities,
    ) -> AppResult<FormSpec> {
        self.component
            .services()
            .assembler()
            .build(self, record, capabilities)
            .await
    }

    /// Returns the record with context-fixed values applied: an unsaved
    /// record in a one-to-many collection carries the bound foreign key.
    #[must_use]
    pub fn prepared_record(&self) -> Record {
        let mut record = self.record.clone();
        if record.is_new()
            && let Some((foreign_key, foreign_id)) = self.collection.foreign_key()
        {
            record.set_field(foreign_key, foreign_id.to_value());
        }
        record
    }

    async fn capabilities(
        &self,
        record: &Record,
        request: &ItemRequest,
    ) -> AppResult<RecordCapabilities> {
        self.component
            .services()
            .gate()
            .capabilities(request.actor(), record)
            .await
    }

    fn singular_name(&self) -> String {
        self.component
            .services()
            .record_types()
            .singular_name(self.record.record_type().as_str())
    }

    fn view_context(&self, form: &FormSpec, back_link: &str) -> AppResult<serde_json::Value> {
        let title = self.record_title();
        let breadcrumbs = self.breadcrumbs();
        serde_json::to_value(DetailFormView {
            backlink: back_link,
            item_edit_form: form,
            title: title.as_str(),
            breadcrumbs: breadcrumbs.as_ref(),
        })
        .map_err(|error| AppError::Internal(format!("failed to serialize detail form view: {error}")))
    }

    fn render_body(&self, form: &FormSpec, back_link: &str) -> AppResult<String> {
        let context = self.view_context(form, back_link)?;
        self.component
            .services()
            .renderer()
            .render(self.template.as_str(), &context)
    }

    fn render_form_fragment(&self, form: &FormSpec) -> AppResult<String> {
        let context = self.view_context(form, self.back_link().as_str())?;
        self.component
            .services()
            .renderer()
            .render(ITEM_FORM_TEMPLATE, &context)
    }

    async fn render(
        &self,
        mut form: FormSpec,
        back_link: &str,
        request: &ItemRequest,
    ) -> AppResult<ItemResponse> {
        if let Some(message) = request.messages().take(&self.form_link()).await? {
            form.set_message(message);
        }

        let body = self.render_body(&form, back_link)?;
        debug!(
            link = %self.link(None),
            fragment = request.is_fragment(),
            "rendered item edit form"
        );

        let controller = self.toplevel_controller();
        ContentNegotiator::negotiate(request.is_fragment(), body, |content| {
            controller.customise(PageContent {
                content,
                title: self.record_title(),
                breadcrumbs: self.breadcrumbs(),
            })
        })
    }
}
