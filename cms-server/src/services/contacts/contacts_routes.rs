use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use cms_axum::{validated_body, CmsAxumError, CurrentPrincipal, PageParams};
use cms_core::{Page, Role};
use serde_json::Value;

use crate::services::categories::Category;
use crate::services::types::SharedState;

use super::contacts_schema::{self, ContactCategoryQuery, ContactQuery, CreateContact, PatchContact};
use super::contacts_shared::Contact;

type ApiResult<T> = Result<T, CmsAxumError>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(find_one).put(update).patch(update).delete(remove))
        .route("/{id}/categories", get(categories))
        .route(
            "/{id}/categories/{category_id}",
            post(add_category).delete(remove_category),
        )
        .with_state(state)
}

async fn list(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Query(filters): Query<ContactQuery>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Contact>>> {
    principal.require(Role::User)?;
    let page = params.to_request(&state.paging)?;
    Ok(Json(state.contacts.list(&filters, &page).await?))
}

async fn create(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    principal.require(Role::User)?;
    let input: CreateContact = validated_body(body, contacts_schema::ERROR_MESSAGE)?;
    let contact = state.contacts.create(input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn find_one(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    principal.require(Role::User)?;
    Ok(Json(state.contacts.get(&id).await?))
}

async fn update(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Contact>> {
    principal.require(Role::User)?;
    let patch: PatchContact = validated_body(body, contacts_schema::ERROR_MESSAGE)?;
    Ok(Json(state.contacts.update(&id, patch).await?))
}

async fn remove(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    principal.require(Role::User)?;
    Ok(Json(state.contacts.delete(&id).await?))
}

async fn categories(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(filters): Query<ContactCategoryQuery>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Category>>> {
    principal.require(Role::User)?;
    let page = params.to_request(&state.paging)?;
    let found = state
        .contacts
        .categories(&id, filters.category_name.as_deref(), &page)
        .await?;
    Ok(Json(found))
}

async fn add_category(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path((id, category_id)): Path<(String, String)>,
) -> ApiResult<Json<Contact>> {
    principal.require(Role::User)?;
    Ok(Json(state.contacts.add_category(&id, &category_id).await?))
}

async fn remove_category(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path((id, category_id)): Path<(String, String)>,
) -> ApiResult<Json<Contact>> {
    principal.require(Role::User)?;
    Ok(Json(state.contacts.remove_category(&id, &category_id).await?))
}
