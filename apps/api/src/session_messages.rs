use async_trait::async_trait;
use gridform_application::FormMessageStore;
use gridform_core::{AppError, AppResult};
use gridform_domain::FormMessage;
use tower_sessions::Session;

const FORM_MESSAGE_KEY_PREFIX: &str = "form_message:";

/// Form messages kept in the visitor's session until the form is next
/// rendered.
#[derive(Clone)]
pub struct SessionMessageStore {
    session: Session,
}

impl SessionMessageStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

fn session_key(form_key: &str) -> String {
    format!("{FORM_MESSAGE_KEY_PREFIX}{form_key}")
}

#[async_trait]
impl FormMessageStore for SessionMessageStore {
    async fn set(&self, form_key: &str, message: FormMessage) -> AppResult<()> {
        self.session
            .insert(&session_key(form_key), message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to store form message: {error}")))
    }

    async fn take(&self, form_key: &str) -> AppResult<Option<FormMessage>> {
        self.session
            .remove::<FormMessage>(&session_key(form_key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to read form message: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gridform_application::FormMessageStore;
    use gridform_domain::{FormMessage, MessageTone};
    use tower_sessions::{MemoryStore, Session};

    use super::SessionMessageStore;

    #[tokio::test]
    async fn messages_are_consumed_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let messages = SessionMessageStore::new(session);
        let notice = FormMessage::text("No delete permissions", MessageTone::Bad);

        assert!(
            messages
                .set("/admin/security/EditForm", notice.clone())
                .await
                .is_ok()
        );

        let taken = messages.take("/admin/security/EditForm").await;
        assert_eq!(taken.ok().flatten(), Some(notice));
        let taken_again = messages.take("/admin/security/EditForm").await;
        assert!(matches!(taken_again, Ok(None)));
    }

    #[tokio::test]
    async fn messages_are_keyed_by_form() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let messages = SessionMessageStore::new(session);

        assert!(
            messages
                .set("/a/ItemEditForm", FormMessage::text("a", MessageTone::Good))
                .await
                .is_ok()
        );

        assert!(matches!(messages.take("/b/ItemEditForm").await, Ok(None)));
    }
}
