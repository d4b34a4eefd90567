use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use models::schemas::{ContactCreate, ContactListResponse, ContactResponse, ContactUpdate};
use service::contacts::ListContactsQuery;
use tracing::info;

use crate::{errors::ApiError, state::AppState};

#[utoipa::path(
    get, path = "/api/contacts", tag = "contacts",
    params(crate::openapi::ListContactsParams),
    responses(
        (status = 200, description = "Matching contacts and their total count", body = crate::openapi::ContactListDoc),
        (status = 422, description = "Invalid query parameters", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListContactsQuery>, QueryRejection>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let Query(q) = query?;
    let page = state.contacts.list(q).await?;
    info!(count = page.items.len(), total = page.total_count, "list contacts");
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/api/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "OK", body = crate::openapi::ContactDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.contacts.get(id).await?))
}

#[utoipa::path(
    post, path = "/api/contacts", tag = "contacts",
    request_body = crate::openapi::ContactInputDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::ContactDoc),
        (status = 400, description = "Email already exists", body = crate::openapi::ErrorDoc),
        (status = 422, description = "Validation Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<ContactCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    let Json(input) = body?;
    let created = state.contacts.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put, path = "/api/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact ID")),
    request_body = crate::openapi::ContactInputDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::ContactDoc),
        (status = 400, description = "Email already exists", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc),
        (status = 422, description = "Validation Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<ContactUpdate>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Json(state.contacts.update(id, input).await?))
}

#[utoipa::path(
    delete, path = "/api/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.contacts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
