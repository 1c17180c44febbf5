use async_trait::async_trait;
use gridform_core::AppResult;
use gridform_domain::FormMessage;

/// Session-scoped store of one-shot form messages, keyed by form link.
#[async_trait]
pub trait FormMessageStore: Send + Sync {
    /// Stores a message shown the next time the form renders.
    async fn set(&self, form_key: &str, message: FormMessage) -> AppResult<()>;

    /// Removes and returns the pending message for a form.
    async fn take(&self, form_key: &str) -> AppResult<Option<FormMessage>>;
}
