use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use service::contact::{Contact, ContactFilter, ContactPatch, UpsertContactInput};

use crate::{errors::JsonApiError, state::ServerState};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive name match, or substring of phone / cpf
    pub search: Option<String>,
    /// Exact segment
    pub segment: Option<i32>,
}

impl From<ListQuery> for ContactFilter {
    fn from(q: ListQuery) -> Self {
        ContactFilter { search: q.search, segment: q.segment }
    }
}

#[utoipa::path(
    get, path = "/contacts", tag = "contacts",
    params(ListQuery),
    responses((status = 200, description = "Contacts, newest first", body = [crate::openapi::ContactDoc]))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> Result<Json<Vec<Contact>>, JsonApiError> {
    let found = state.contacts.list(&q.into()).await?;
    info!(count = found.len(), "list contacts");
    Ok(Json(found))
}

#[utoipa::path(
    post, path = "/contacts", tag = "contacts",
    request_body = crate::openapi::UpsertContactDoc,
    responses(
        (status = 200, description = "Created or merged", body = crate::openapi::ContactDoc),
        (status = 400, description = "Validation Error"),
        (status = 409, description = "Concurrent creation for the same phone")
    )
)]
pub async fn upsert(State(state): State<ServerState>, Json(input): Json<UpsertContactInput>) -> Result<Json<Contact>, JsonApiError> {
    Ok(Json(state.contacts.upsert_by_phone(input).await?))
}

#[utoipa::path(
    get, path = "/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact id")),
    responses((status = 200, description = "Found", body = crate::openapi::ContactDoc), (status = 404, description = "Not Found"))
)]
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<Json<Contact>, JsonApiError> {
    Ok(Json(state.contacts.get_by_id(id).await?))
}

/// Responds `null` when no contact has this phone.
#[utoipa::path(
    get, path = "/contacts/phone/{phone}", tag = "contacts",
    params(("phone" = String, Path, description = "Contact phone")),
    responses((status = 200, description = "Contact or null", body = crate::openapi::ContactDoc))
)]
pub async fn get_by_phone(State(state): State<ServerState>, Path(phone): Path<String>) -> Result<Json<Option<Contact>>, JsonApiError> {
    Ok(Json(state.contacts.get_by_phone(&phone).await?))
}

#[utoipa::path(
    patch, path = "/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact id")),
    request_body = crate::openapi::ContactPatchDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::ContactDoc), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found"))
)]
pub async fn update_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, JsonApiError> {
    Ok(Json(state.contacts.update_by_id(id, patch).await?))
}

#[utoipa::path(
    patch, path = "/contacts/phone/{phone}", tag = "contacts",
    params(("phone" = String, Path, description = "Contact phone")),
    request_body = crate::openapi::ContactPatchDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::ContactDoc), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found"))
)]
pub async fn update_by_phone(
    State(state): State<ServerState>,
    Path(phone): Path<String>,
    Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, JsonApiError> {
    Ok(Json(state.contacts.update_by_phone(&phone, patch).await?))
}

#[utoipa::path(
    delete, path = "/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn remove_by_id(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<StatusCode, JsonApiError> {
    state.contacts.remove_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
