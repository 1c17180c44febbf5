use async_trait::async_trait;
use gridform_core::{AppResult, UserIdentity};
use gridform_domain::{Record, RecordCapabilities};

/// Authorization port answering record capability questions.
#[async_trait]
pub trait RecordPolicy: Send + Sync {
    /// Evaluates view, edit, delete and create capabilities for one actor
    /// and one record instance.
    async fn capabilities(
        &self,
        actor: &UserIdentity,
        record: &Record,
    ) -> AppResult<RecordCapabilities>;
}
