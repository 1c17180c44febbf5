use gridform_core::{AppError, AppResult};
use gridform_domain::{FormMessage, MessageTone, html_escape};
use tracing::{info, warn};

use super::{EnclosingHandler, ItemRequestHandler};
use crate::content_negotiator::CONTENT_FRAGMENT;
use crate::item_exchange::{ItemRequest, ItemResponse};
use crate::translations::{DELETE_PERMISSION_FAILURE, DELETED_MESSAGE};

impl ItemRequestHandler {
    /// Deletes the record and redirects one level up.
    ///
    /// A missing delete capability is reported as a form message, not as an
    /// authorization error, and the record is left untouched.
    pub async fn do_delete(&self, request: &ItemRequest) -> AppResult<ItemResponse> {
        let title = self.record.display_title();
        let back_link = self.back_link();
        let services = self.component.services();
        let capabilities = self.capabilities(&self.record, request).await?;

        let outcome = if capabilities.can_delete {
            services.store().delete(&self.record).await
        } else {
            Err(AppError::Validation(
                services.translations().text(DELETE_PERMISSION_FAILURE, &[]),
            ))
        };

        match outcome {
            Ok(()) => {}
            Err(AppError::Validation(message)) => {
                warn!(link = %self.link(None), %message, "item delete refused");
                request
                    .messages()
                    .set(
                        &self.notice_form_link(),
                        FormMessage::text(&message, MessageTone::Bad),
                    )
                    .await?;
                return Ok(ItemResponse::redirect_refreshing(back_link, CONTENT_FRAGMENT));
            }
            Err(error) => return Err(error),
        }

        let singular_name = html_escape(&self.singular_name());
        let escaped_title = html_escape(&title);
        let message = FormMessage::html(
            services.translations().text(
                DELETED_MESSAGE,
                &[
                    ("name", singular_name.as_str()),
                    ("title", escaped_title.as_str()),
                ],
            ),
            MessageTone::Good,
        );

        request.messages().set(&self.notice_form_link(), message).await?;

        info!(
            record_type = self.record.record_type().as_str(),
            record_id = self.record.id().map(|id| id.get()),
            "deleted item"
        );
        Ok(ItemResponse::redirect_refreshing(back_link, CONTENT_FRAGMENT))
    }

    /// Form that shows delete notices after the redirect away from the item.
    ///
    /// Page chrome keeps the notice on its own form; nested items use the
    /// local form.
    fn notice_form_link(&self) -> String {
        match &self.parent {
            EnclosingHandler::Controller(controller) if controller.is_page_chrome() => {
                self.parent.form_link()
            }
            _ => self.form_link(),
        }
    }
}
