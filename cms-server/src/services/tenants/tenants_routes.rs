use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use cms_axum::{validated_body, CmsAxumError, CurrentPrincipal, PageParams};
use cms_core::{Page, Role};
use serde_json::Value;

use crate::services::types::SharedState;

use super::tenants_schema::{self, CreateTenant, PatchTenant, TenantQuery};
use super::tenants_shared::TenantView;

type ApiResult<T> = Result<T, CmsAxumError>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(find_one).put(update).patch(update).delete(remove))
        .with_state(state)
}

async fn list(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Query(filters): Query<TenantQuery>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<TenantView>>> {
    principal.require(Role::Admin)?;
    let page = params.to_request(&state.paging)?;
    Ok(Json(state.tenants.list(filters.name.as_deref(), &page).await?))
}

async fn create(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TenantView>)> {
    principal.require(Role::Admin)?;
    let input: CreateTenant = validated_body(body, tenants_schema::ERROR_MESSAGE)?;
    Ok((StatusCode::CREATED, Json(state.tenants.create(input).await?)))
}

async fn find_one(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TenantView>> {
    principal.require(Role::Admin)?;
    Ok(Json(state.tenants.get(&id).await?.into()))
}

async fn update(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<TenantView>> {
    principal.require(Role::Admin)?;
    let patch: PatchTenant = validated_body(body, tenants_schema::ERROR_MESSAGE)?;
    Ok(Json(state.tenants.update(&id, patch).await?))
}

async fn remove(
    principal: CurrentPrincipal,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TenantView>> {
    principal.require(Role::Admin)?;
    Ok(Json(state.tenants.delete(&id).await?))
}
