use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use blogr_db::ConnectionScope;
use blogr_types::models::User;

use crate::auth::AppState;
use crate::error::AppError;
use crate::session::SESSION_COOKIE;

/// The signed-in user for this request, if any. Set by [`load_current_user`].
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// Everything a handler needs about the request it is serving: its
/// connection scope and the signed-in user.
#[derive(Clone)]
pub struct RequestContext {
    pub db: Arc<ConnectionScope>,
    pub user: Option<User>,
}

impl RequestContext {
    pub fn require_user(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or(AppError::LoginRequired)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let db = parts
            .extensions
            .get::<Arc<ConnectionScope>>()
            .cloned()
            .ok_or_else(|| anyhow!("connection scope missing from request"))?;

        let user = parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone());

        Ok(Self { db, user })
    }
}

/// Give the request its own connection scope and release it once the
/// response is produced. The scope's `Drop` covers unwinding.
pub async fn connection_scope(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let scope = Arc::new(state.db.scope());
    request.extensions_mut().insert(scope.clone());

    let response = next.run(request).await;

    scope.release();
    response
}

/// Resolve the session cookie to a user row. Missing, invalid and dangling
/// sessions all leave the request anonymous.
pub async fn load_current_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.verify(cookie.value()));

    let user = match user_id {
        Some(id) => {
            let scope = request
                .extensions()
                .get::<Arc<ConnectionScope>>()
                .cloned()
                .ok_or_else(|| anyhow!("connection scope missing from request"))?;

            let row = scope.get_user_by_id(id)?;
            if row.is_none() {
                debug!("Session names unknown user {}", id);
            }
            row.map(|row| row.to_user())
        }
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
