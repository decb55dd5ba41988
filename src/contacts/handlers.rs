use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::{RequireAdmin, RequireUser};
use crate::contacts::dto::{
    ContactEnvelope, ContactPage, CreateContactRequest, ListQuery, UpdateContactRequest,
};
use crate::contacts::repo::Contact;
use crate::contacts::services;
use crate::error::{AppError, OkResponse};
use crate::state::AppState;

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_all).post(create_contact))
        .route("/contacts/mine", get(list_mine))
        .route(
            "/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_contact(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(payload): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactEnvelope>), AppError> {
    let fields = services::validate_new(payload)?;
    let contact = Contact::insert(&state.db, user.id, &fields).await?;
    info!(contact_id = %contact.id, user_id = %user.id, "contact created");
    Ok((
        StatusCode::CREATED,
        Json(ContactEnvelope {
            contact: contact.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ContactPage>, AppError> {
    let page = services::list(&state, Some(user.id), query).await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<ContactPage>, AppError> {
    let page = services::list(&state, None, query).await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn get_contact(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ContactEnvelope>, AppError> {
    let contact = Contact::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Contact"))?;
    Ok(Json(ContactEnvelope {
        contact: contact.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_contact(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<Json<ContactEnvelope>, AppError> {
    let existing = Contact::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Contact"))?;
    let fields = services::apply_update(&existing, payload)?;
    let contact = Contact::update(&state.db, id, &fields)
        .await?
        .ok_or(AppError::NotFound("Contact"))?;
    info!(contact_id = %id, admin_id = %admin.id, "contact updated");
    Ok(Json(ContactEnvelope {
        contact: contact.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, AppError> {
    if !Contact::delete(&state.db, id).await? {
        return Err(AppError::NotFound("Contact"));
    }
    info!(contact_id = %id, admin_id = %admin.id, "contact deleted");
    Ok(Json(OkResponse { success: true }))
}
