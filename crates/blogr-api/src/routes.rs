use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::context::{connection_scope, load_current_user};
use crate::middleware::require_login;
use crate::posts;

/// Build the full application router.
///
/// Layer order, outermost first: tracing, connection scope, current user,
/// then the login gate on protected routes only.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(posts::index))
        .route("/hello", get(hello))
        .route("/auth/register", get(auth::register_form).post(auth::register))
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/logout", get(auth::logout));

    let protected_routes = Router::new()
        .route("/create", get(posts::create_form).post(posts::create_post))
        .route("/{id}/update", get(posts::update_form).post(posts::update_post))
        .route("/{id}/delete", post(posts::delete_post))
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), load_current_user))
        .layer(middleware::from_fn_with_state(state.clone(), connection_scope))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello, World!"
}
