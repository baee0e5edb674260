use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::context::CurrentUser;

/// Gate for protected routes: anonymous requests are sent to the login
/// page and the wrapped handler never runs.
pub async fn require_login(request: Request, next: Next) -> Response {
    let signed_in = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.is_some());

    if !signed_in {
        return Redirect::to("/auth/login").into_response();
    }

    next.run(request).await
}
