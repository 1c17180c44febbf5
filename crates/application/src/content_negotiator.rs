use std::collections::BTreeMap;

use gridform_core::AppResult;

use crate::item_exchange::ItemResponse;

/// Fragment holding the item edit form.
pub const FORM_FRAGMENT: &str = "CurrentForm";

/// Fragment holding the main page content.
pub const CONTENT_FRAGMENT: &str = "Content";

/// Chooses between partial content and a full page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentNegotiator;

impl ContentNegotiator {
    /// Returns the fragment verbatim for fragment requests and wraps it into
    /// the full page otherwise.
    pub fn negotiate<F>(is_fragment: bool, fragment: String, full_page: F) -> AppResult<ItemResponse>
    where
        F: FnOnce(String) -> AppResult<String>,
    {
        let body = if is_fragment {
            fragment
        } else {
            full_page(fragment)?
        };

        Ok(ItemResponse::Content {
            body,
            fragment: None,
        })
    }
}

type FragmentProducer<'a> = Box<dyn FnOnce() -> AppResult<String> + Send + 'a>;
type DefaultResponder<'a> = Box<dyn FnOnce() -> AppResult<ItemResponse> + Send + 'a>;

/// Responds with the named fragments a request asks for.
///
/// One matching fragment is returned as content targeting it; several are
/// returned together. When nothing matches, the default responder runs.
pub struct ResponseNegotiator<'a> {
    fragments: BTreeMap<String, FragmentProducer<'a>>,
    default: DefaultResponder<'a>,
}

impl<'a> ResponseNegotiator<'a> {
    /// Creates a negotiator with its fallback responder.
    #[must_use]
    pub fn new(default: impl FnOnce() -> AppResult<ItemResponse> + Send + 'a) -> Self {
        Self {
            fragments: BTreeMap::new(),
            default: Box::new(default),
        }
    }

    /// Registers a fragment producer.
    #[must_use]
    pub fn fragment(
        mut self,
        name: impl Into<String>,
        producer: impl FnOnce() -> AppResult<String> + Send + 'a,
    ) -> Self {
        self.fragments.insert(name.into(), Box::new(producer));
        self
    }

    /// Produces the response for the requested fragment names.
    pub fn respond(self, requested: &[String]) -> AppResult<ItemResponse> {
        let mut producers = self.fragments;
        let mut produced = BTreeMap::new();
        for name in requested {
            if let Some(producer) = producers.remove(name) {
                produced.insert(name.clone(), producer()?);
            }
        }

        if produced.len() > 1 {
            return Ok(ItemResponse::Fragments(produced));
        }

        match produced.pop_first() {
            Some((name, body)) => Ok(ItemResponse::Content {
                body,
                fragment: Some(name),
            }),
            None => (self.default)(),
        }
    }
}
