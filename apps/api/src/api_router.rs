use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<MemoryStore>,
) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/admin/{section}",
            get(handlers::admin::section_handler),
        )
        .route(
            "/admin/{section}/EditForm/{*rest}",
            get(handlers::admin::item_get_handler).post(handlers::admin::item_post_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/logout", post(auth::logout_handler));
    if app_state.dev_login_enabled {
        router = router.route("/auth/dev-login", post(auth::dev_login_handler));
    }

    router
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
        .with_state(app_state)
}
