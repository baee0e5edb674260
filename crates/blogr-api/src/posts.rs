use axum::{
    Form,
    extract::Path,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use blogr_db::ConnectionScope;
use blogr_types::api::PostForm;
use blogr_types::models::{Post, User};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::pages;

// -- Service --

pub fn list(db: &ConnectionScope) -> Result<Vec<Post>, AppError> {
    let posts = db
        .list_posts()?
        .into_iter()
        .map(|row| row.into_post())
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(posts)
}

pub fn get(db: &ConnectionScope, post_id: i64) -> Result<Post, AppError> {
    db.get_post(post_id)?
        .ok_or_else(|| not_found(post_id))?
        .into_post()
        .map_err(AppError::from)
}

/// Fetch a post the caller is allowed to change.
pub fn get_owned(db: &ConnectionScope, post_id: i64, user: &User) -> Result<Post, AppError> {
    let post = get(db, post_id)?;
    if !post.is_owned_by(user) {
        warn!(
            "{} ({}) tried to modify post {} owned by {}",
            user.username, user.id, post_id, post.author_id
        );
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

pub fn create(db: &ConnectionScope, author: &User, title: &str, body: &str) -> Result<i64, AppError> {
    require_title(title)?;
    let post_id = db.insert_post(author.id, title, body)?;
    info!("{} created post {}", author.username, post_id);
    Ok(post_id)
}

pub fn update(
    db: &ConnectionScope,
    post_id: i64,
    user: &User,
    title: &str,
    body: &str,
) -> Result<(), AppError> {
    get_owned(db, post_id, user)?;
    require_title(title)?;

    if !db.update_post(post_id, title, body)? {
        return Err(not_found(post_id));
    }
    info!("{} updated post {}", user.username, post_id);
    Ok(())
}

pub fn delete(db: &ConnectionScope, post_id: i64, user: &User) -> Result<(), AppError> {
    get_owned(db, post_id, user)?;

    if !db.delete_post(post_id)? {
        return Err(not_found(post_id));
    }
    info!("{} deleted post {}", user.username, post_id);
    Ok(())
}

fn require_title(title: &str) -> Result<(), AppError> {
    if title.is_empty() {
        return Err(AppError::Validation("Title is required.".into()));
    }
    Ok(())
}

fn not_found(post_id: i64) -> AppError {
    AppError::NotFound(format!("Post id {} doesn't exist.", post_id))
}

// -- Handlers --

pub async fn index(ctx: RequestContext) -> Result<Html<String>, AppError> {
    let posts = list(&ctx.db)?;
    Ok(pages::index(ctx.user.as_ref(), &posts))
}

pub async fn create_form(ctx: RequestContext) -> Result<Html<String>, AppError> {
    let user = ctx.require_user()?;
    Ok(pages::create(Some(user), None, &PostForm::default()))
}

pub async fn create_post(
    ctx: RequestContext,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;

    match create(&ctx.db, user, &form.title, &form.body) {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e) if e.is_form_error() => {
            Ok(pages::create(Some(user), Some(&e.to_string()), &form).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn update_form(
    ctx: RequestContext,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let user = ctx.require_user()?;
    let post = get_owned(&ctx.db, post_id, user)?;

    let form = PostForm {
        title: post.title.clone(),
        body: post.body.clone(),
    };
    Ok(pages::update(Some(user), &post, None, &form))
}

pub async fn update_post(
    ctx: RequestContext,
    Path(post_id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;

    match update(&ctx.db, post_id, user, &form.title, &form.body) {
        Ok(()) => Ok(Redirect::to("/").into_response()),
        Err(e) if e.is_form_error() => {
            let post = get_owned(&ctx.db, post_id, user)?;
            Ok(pages::update(Some(user), &post, Some(&e.to_string()), &form).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_post(
    ctx: RequestContext,
    Path(post_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let user = ctx.require_user()?;
    delete(&ctx.db, post_id, user)?;
    Ok(Redirect::to("/"))
}
