use gridform_application::join_links;
use gridform_core::{AppResult, UserIdentity};
use gridform_domain::FormMessage;
use serde::Serialize;

use crate::admin_section::{AdminSection, HostedCollection};
use crate::state::AppState;

#[derive(Serialize)]
pub(super) struct SectionView {
    pub message: Option<FormMessage>,
    pub collections: Vec<CollectionListing>,
}

#[derive(Debug, Serialize)]
pub(super) struct CollectionListing {
    pub title: String,
    pub rows: Vec<ListingRow>,
    pub new_link: Option<String>,
    pub singular_name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ListingRow {
    pub link: String,
    pub title: String,
}

/// Lists the records of a hosted collection the user may view, with an add
/// link when the user may create them.
pub(super) async fn list_collection(
    state: &AppState,
    section: &AdminSection,
    hosted: &HostedCollection,
    user: &UserIdentity,
) -> AppResult<CollectionListing> {
    let collection = hosted.collection();
    let collection_name = collection.name().as_str();
    let gate = hosted.component().services().gate();

    let mut rows = Vec::new();
    for record in state.store.list(collection).await? {
        let Some(id) = record.id() else {
            continue;
        };
        if !gate.capabilities(user, &record).await?.can_view {
            continue;
        }

        rows.push(ListingRow {
            link: item_link(section, collection_name, &id.to_string()),
            title: record.display_title(),
        });
    }

    let element_type = collection.element_type().as_str();
    let blank = state.record_types.instantiate(element_type)?;
    let new_link = gate
        .capabilities(user, &blank)
        .await?
        .can_create
        .then(|| item_link(section, collection_name, "new"));

    Ok(CollectionListing {
        title: hosted.title().to_owned(),
        rows,
        new_link,
        singular_name: state.record_types.singular_name(element_type),
    })
}

/// Link of a record inside a hosted collection of the section form.
fn item_link(section: &AdminSection, collection: &str, id_segment: &str) -> String {
    join_links([
        section.form_link().as_str(),
        "field",
        collection,
        "item",
        id_segment,
    ])
}
