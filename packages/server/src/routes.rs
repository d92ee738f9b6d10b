use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use linkhold::{LinkError, LinkStore, UserId};
use serde::Deserialize;

use crate::app::AppState;

/// Identity and email of the caller, from the headers set by the fronting
/// auth proxy: `x-auth-user` carries the stable identity key and
/// `x-auth-email` the account email, falling back to the identity value
/// when the proxy does not send one.
fn caller_headers(headers: &HeaderMap) -> Option<(&str, &str)> {
    let identity = headers
        .get("x-auth-user")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())?;
    let email = headers
        .get("x-auth-email")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(identity);
    Some((identity, email))
}

/// Resolve the caller, lazily creating the user record on first access.
async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<UserId, Response> {
    let (identity, email) =
        caller_headers(headers).ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

    let user = state
        .store
        .get_or_create_user(identity, email)
        .await
        .map_err(|e| {
            tracing::error!(identity = %identity, error = %e, "failed to resolve user");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?;
    Ok(user.id)
}

fn error_response(err: LinkError) -> Response {
    let status = match &err {
        LinkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LinkError::Conflict => StatusCode::CONFLICT,
        LinkError::NotFound => StatusCode::NOT_FOUND,
        LinkError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string()).into_response()
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_links(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let owner = match current_user(&state, &headers).await {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match linkhold::list_links(&*state.store, owner).await {
        Ok(links) => Json(links).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn export_urls(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let owner = match current_user(&state, &headers).await {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match linkhold::export_urls(&*state.store, owner).await {
        Ok(urls) => urls.into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct AddForm {
    pub url: String,
}

pub async fn add_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AddForm>,
) -> Response {
    let owner = match current_user(&state, &headers).await {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match linkhold::add_link(&*state.store, &*state.fetcher, owner, &form.url).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct BatchAddForm {
    pub urls: String,
}

pub async fn batch_add_links(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BatchAddForm>,
) -> Response {
    let owner = match current_user(&state, &headers).await {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match linkhold::add_links(&*state.store, &*state.fetcher, owner, &form.urls).await {
        Ok(results) => Json(results).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct EditForm {
    pub key: String,
    pub title: String,
}

pub async fn edit_title(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EditForm>,
) -> Response {
    if let Err(resp) = current_user(&state, &headers).await {
        return resp;
    }
    match linkhold::edit_title(&*state.store, &form.key, &form.title).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    if let Err(resp) = current_user(&state, &headers).await {
        return resp;
    }
    match linkhold::delete_link(&*state.store, &key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}
