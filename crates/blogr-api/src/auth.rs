use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::info;

use blogr_crypto::password::{hash_password, verify_password};
use blogr_db::{ConnectionManager, ConnectionScope};
use blogr_types::api::CredentialsForm;
use blogr_types::models::User;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::pages;
use crate::session::{SessionKeys, expired_session_cookie, session_cookie};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: ConnectionManager,
    pub sessions: SessionKeys,
}

/// Create an account. The new user still has to log in.
pub fn register_user(db: &ConnectionScope, username: &str, password: &str) -> Result<i64, AppError> {
    if username.is_empty() {
        return Err(AppError::Validation("Username is required.".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password is required.".into()));
    }

    let password_hash = hash_password(password)?;

    db.create_user(username, &password_hash)?
        .ok_or_else(|| AppError::Conflict(format!("User {} is already registered.", username)))
}

/// Check credentials and return the matching user.
pub fn authenticate(db: &ConnectionScope, username: &str, password: &str) -> Result<User, AppError> {
    let row = db
        .get_user_by_username(username)?
        .ok_or_else(|| AppError::Auth("Incorrect username.".into()))?;

    if !verify_password(&row.password, password) {
        return Err(AppError::Auth("Incorrect password.".into()));
    }

    Ok(row.to_user())
}

pub async fn register_form(ctx: RequestContext) -> Html<String> {
    pages::register(ctx.user.as_ref(), None, "")
}

pub async fn register(
    ctx: RequestContext,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match register_user(&ctx.db, &form.username, &form.password) {
        Ok(user_id) => {
            info!("Registered {} ({})", form.username, user_id);
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(e) if e.is_form_error() => {
            Ok(pages::register(ctx.user.as_ref(), Some(&e.to_string()), &form.username).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn login_form(ctx: RequestContext) -> Html<String> {
    pages::login(ctx.user.as_ref(), None, "")
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match authenticate(&ctx.db, &form.username, &form.password) {
        Ok(user) => {
            // A fresh cookie replaces whatever session the client had
            let token = state.sessions.issue(user.id)?;
            info!("{} ({}) logged in", user.username, user.id);
            Ok((jar.add(session_cookie(token)), Redirect::to("/")).into_response())
        }
        Err(e) if e.is_form_error() => {
            Ok(pages::login(ctx.user.as_ref(), Some(&e.to_string()), &form.username).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(ctx: RequestContext, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(user) = &ctx.user {
        info!("{} ({}) logged out", user.username, user.id);
    }
    (jar.remove(expired_session_cookie()), Redirect::to("/"))
}
