use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gridform_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{DevLoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

/// Signs in as any subject. Only mounted when development login is enabled.
pub async fn dev_login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<DevLoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    if !state.dev_login_enabled {
        return Err(AppError::Forbidden("development login is disabled".to_owned()).into());
    }

    let subject = payload.subject.trim().to_owned();
    if subject.is_empty() {
        return Err(AppError::Validation("subject is required".to_owned()).into());
    }
    let display_name = payload
        .display_name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| subject.clone());
    let identity = UserIdentity::new(subject, display_name, None);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to rotate session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, identity.clone())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    info!(subject = %identity.subject(), "development login");
    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}
