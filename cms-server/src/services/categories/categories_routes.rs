use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use cms_axum::{validated_body, CmsAxumError, CurrentPrincipal, PageParams};
use cms_core::{Page, Role};
use serde_json::Value;

use crate::services::contacts::Contact;
use crate::services::types::SharedState;

use super::categories_schema::{self, CategoryContactsQuery, CategoryQuery, CreateCategory, PatchCategory};
use super::categories_shared::Category;

type ApiResult<T> = Result<T, CmsAxumError>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(find_one).put(update).patch(update).delete(remove))
        .route("/{id}/contacts", get(contacts))
        .with_state(state)
}

async fn list(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Query(filters): Query<CategoryQuery>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Category>>> {
    principal.require(Role::User)?;
    let page = params.to_request(&state.paging)?;
    let found = state
        .categories
        .list(filters.category_name.as_deref(), &page)
        .await?;
    Ok(Json(found))
}

async fn create(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    principal.require(Role::User)?;
    let input: CreateCategory = validated_body(body, categories_schema::ERROR_MESSAGE)?;
    Ok((StatusCode::CREATED, Json(state.categories.create(input).await?)))
}

async fn find_one(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    principal.require(Role::User)?;
    Ok(Json(state.categories.get(&id).await?))
}

async fn update(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    principal.require(Role::User)?;
    let patch: PatchCategory = validated_body(body, categories_schema::ERROR_MESSAGE)?;
    Ok(Json(state.categories.update(&id, patch).await?))
}

async fn remove(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    principal.require(Role::User)?;
    Ok(Json(state.categories.delete(&id).await?))
}

async fn contacts(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(filters): Query<CategoryContactsQuery>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Contact>>> {
    principal.require(Role::User)?;
    let page = params.to_request(&state.paging)?;
    Ok(Json(state.categories.contacts(&id, &filters, &page).await?))
}
