use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Form, Path, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use gridform_application::{
    DetailFormComponent, EnclosingHandler, FormMessageStore, ItemAction, ItemRequest,
    ItemResponse, PageContent, PageController, PermissionGate,
};
use gridform_core::{AppError, AppResult, UserIdentity};
use gridform_domain::{Collection, FormMessage, Record, RecordPermission};
use gridform_infrastructure::ADMIN_SECTION_TEMPLATE;
use serde_json::{Map, Value};
use tower_sessions::Session;
use tracing::info;

use crate::admin_section::{AdminPageController, AdminSection, HostedCollection};
use crate::dto::BreadcrumbResponse;
use crate::error::ApiResult;
use crate::item_path::{ItemPath, ItemTail};
use crate::item_responses::{FragmentRequest, into_http_response};
use crate::session_messages::SessionMessageStore;
use crate::state::AppState;

mod listing;


use listing::{CollectionListing, SectionView};

/// Trailing action returning the navigation trail of an item as JSON.
const BREADCRUMBS_ACTION: &str = "breadcrumbs";

/// Renders the section page listing its hosted collections.
pub async fn section_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(section_name): Path<String>,
    session: Session,
) -> ApiResult<Html<String>> {
    let section = state.section(&section_name)?;
    let messages = SessionMessageStore::new(session);
    let message = messages.take(&section.form_link()).await?;

    let mut collections = Vec::with_capacity(section.collections().len());
    for hosted in section.collections() {
        collections.push(listing::list_collection(&state, &section, hosted, &user).await?);
    }

    let content = render_section(&state, message, collections)?;
    let controller = page_controller(&state, &section);
    let page = controller.customise(PageContent {
        content,
        title: section.title().to_owned(),
        breadcrumbs: controller.breadcrumbs(),
    })?;

    Ok(Html(page))
}

/// Renders, or runs a read action on, a possibly nested item.
pub async fn item_get_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((section_name, rest)): Path<(String, String)>,
    session: Session,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let path = ItemPath::parse(&rest)?;
    let action = match &path.tail {
        ItemTail::Action(name) if name == BREADCRUMBS_ACTION => {
            return breadcrumbs(&state, &section_name, &path, &user).await;
        }
        ItemTail::Action(name) => ItemAction::from_segment(Some(name.as_str()))?,
        ItemTail::Default | ItemTail::Form => ItemAction::from_segment(None)?,
    };

    dispatch(&state, &section_name, &path, action, user, session, &headers).await
}

/// Accepts a submission of an item's edit form.
pub async fn item_post_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((section_name, rest)): Path<(String, String)>,
    session: Session,
    headers: HeaderMap,
    Form(submitted): Form<HashMap<String, String>>,
) -> ApiResult<Response> {
    let path = ItemPath::parse(&rest)?;
    if path.tail != ItemTail::Form {
        return Err(AppError::NotFound(format!(
            "'{rest}' does not accept form submissions"
        ))
        .into());
    }

    let data: Map<String, Value> = submitted
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    let action = ItemAction::from_submission(data)?;

    dispatch(&state, &section_name, &path, action, user, session, &headers).await
}

async fn dispatch(
    state: &AppState,
    section_name: &str,
    path: &ItemPath,
    action: ItemAction,
    user: UserIdentity,
    session: Session,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let section = state.section(section_name)?;
    let item = match resolve_chain(state, &section, path, &user).await? {
        ItemChain::Item(item) => item,
        ItemChain::Redirect(response) => return into_http_response(response),
    };

    let fragment_request = FragmentRequest::from_headers(headers);
    let mut request = ItemRequest::new(user, Arc::new(SessionMessageStore::new(session)));
    if fragment_request.is_fragment {
        request = request.as_fragment(fragment_request.fragments);
    }
    if let Some(referer) = fragment_request.referer {
        request = request.with_referer(referer);
    }

    let response = item
        .component
        .handle_item(
            item.collection,
            item.id_segment.as_deref(),
            item.parent,
            action,
            &request,
        )
        .await?;

    into_http_response(response)
}

async fn breadcrumbs(
    state: &AppState,
    section_name: &str,
    path: &ItemPath,
    user: &UserIdentity,
) -> ApiResult<Response> {
    let section = state.section(section_name)?;
    let item = match resolve_chain(state, &section, path, user).await? {
        ItemChain::Item(item) => item,
        ItemChain::Redirect(response) => return into_http_response(response),
    };

    let handler = item
        .component
        .item_handler(item.collection, item.id_segment.as_deref(), item.parent)
        .await?;
    require_view(&item.component, handler.record(), user).await?;

    let trail: Vec<BreadcrumbResponse> = handler
        .breadcrumbs()
        .map(|trail| trail.items().iter().map(BreadcrumbResponse::from).collect())
        .unwrap_or_default();

    Ok(Json(trail).into_response())
}

/// Innermost item of a URL, ready to be handled.
struct ResolvedItem {
    component: DetailFormComponent,
    collection: Collection,
    id_segment: Option<String>,
    parent: EnclosingHandler,
}

enum ItemChain {
    Item(ResolvedItem),
    Redirect(ItemResponse),
}

/// Walks the nested item steps, building one handler per enclosing record.
///
/// An enclosing record that no longer exists redirects to its own hosting
/// page, the same way a missing innermost record does.
async fn resolve_chain(
    state: &AppState,
    section: &Arc<AdminSection>,
    path: &ItemPath,
    user: &UserIdentity,
) -> AppResult<ItemChain> {
    let Some((first, nested)) = path.steps.split_first() else {
        return Err(AppError::NotFound("item path has no steps".to_owned()));
    };
    let hosted = hosted_collection(section, &first.collection)?;

    let mut item = ResolvedItem {
        component: hosted.component().clone(),
        collection: hosted.collection().clone(),
        id_segment: first.id_segment.clone(),
        parent: EnclosingHandler::Controller(page_controller(state, section)),
    };

    for step in nested {
        let hosting_link = item.parent.link();
        let handler = match item
            .component
            .item_handler(item.collection, item.id_segment.as_deref(), item.parent)
            .await
        {
            Ok(handler) => handler,
            Err(AppError::NotFound(message)) => {
                info!(%message, location = %hosting_link, "enclosing item not found, redirecting");
                return Ok(ItemChain::Redirect(ItemResponse::redirect(hosting_link)));
            }
            Err(error) => return Err(error),
        };
        require_view(&item.component, handler.record(), user).await?;

        let record = handler.record();
        let relation = state
            .record_types
            .relation(record.record_type().as_str(), &step.collection)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} has no relation '{}'",
                    record.record_type(),
                    step.collection
                ))
            })?;
        let collection = Collection::for_relation(record, relation)?;

        item = ResolvedItem {
            component: state.relation_component(&step.collection).clone(),
            collection,
            id_segment: step.id_segment.clone(),
            parent: EnclosingHandler::Item(handler),
        };
    }

    Ok(ItemChain::Item(item))
}

async fn require_view(
    component: &DetailFormComponent,
    record: &Record,
    user: &UserIdentity,
) -> AppResult<()> {
    let capabilities = component.services().gate().capabilities(user, record).await?;
    PermissionGate::require(capabilities, RecordPermission::View, record)
}

fn hosted_collection<'a>(
    section: &'a AdminSection,
    collection_name: &str,
) -> AppResult<&'a HostedCollection> {
    section.collection(collection_name).ok_or_else(|| {
        AppError::NotFound(format!(
            "section '{}' has no collection '{collection_name}'",
            section.name()
        ))
    })
}

fn page_controller(state: &AppState, section: &Arc<AdminSection>) -> Arc<dyn PageController> {
    Arc::new(AdminPageController::new(
        Arc::clone(section),
        state.renderer.clone(),
    ))
}

fn render_section(
    state: &AppState,
    message: Option<FormMessage>,
    collections: Vec<CollectionListing>,
) -> AppResult<String> {
    let context = serde_json::to_value(SectionView {
        message,
        collections,
    })
    .map_err(|error| AppError::Internal(format!("failed to serialize section view: {error}")))?;

    state.renderer.render(ADMIN_SECTION_TEMPLATE, &context)
}
