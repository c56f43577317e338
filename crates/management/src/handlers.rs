//! Axum REST handlers for the management API.

use crate::auth::{AdminUser, AuthService};
use crate::models::*;
use crate::store::ManagementStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use lci_core::types::{CampaignRecord, Influencer, Partner, Product, User};
use lci_core::LciError;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<ManagementStore>,
    pub auth: Arc<AuthService>,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Map a domain error onto an HTTP status and JSON body.
pub fn error_response(e: LciError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &e {
        LciError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        LciError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        LciError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        LciError::Email(_) => (StatusCode::BAD_GATEWAY, "email_failed"),
        _ => {
            error!(error = %e, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: e.to_string(),
        }),
    )
}

fn not_found(kind: &str, id: Uuid) -> (StatusCode, Json<ErrorResponse>) {
    error_response(LciError::NotFound(format!("{kind} {id}")))
}

fn deleted(removed: bool, counter: &'static str) -> StatusCode {
    if removed {
        metrics::counter!(counter).increment(1);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn handle_login(
    State(state): State<ManagementState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let resp = state.auth.authenticate(&req).map_err(error_response)?;
    state.store.log_audit(&resp.user, AuditAction::Login, "session", Uuid::nil(), serde_json::json!({}));
    Ok(Json(resp))
}

// ─── Influencers ───────────────────────────────────────────────────────────

pub async fn list_influencers(State(state): State<ManagementState>) -> Json<Vec<Influencer>> {
    Json(state.store.list_influencers())
}

pub async fn get_influencer(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Influencer>> {
    state
        .store
        .get_influencer(id)
        .map(Json)
        .ok_or_else(|| not_found("influencer", id))
}

pub async fn create_influencer(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Json(req): Json<CreateInfluencerRequest>,
) -> ApiResult<(StatusCode, Json<Influencer>)> {
    let influencer = state.store.create_influencer(req, &admin).map_err(error_response)?;
    metrics::counter!("management.influencers.created").increment(1);
    Ok((StatusCode::CREATED, Json(influencer)))
}

pub async fn update_influencer(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInfluencerRequest>,
) -> ApiResult<Json<Influencer>> {
    state
        .store
        .update_influencer(id, req, &admin)
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_influencer(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    deleted(state.store.delete_influencer(id, &admin), "management.influencers.deleted")
}

// ─── Products ──────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<ManagementState>) -> Json<Vec<Product>> {
    Json(state.store.list_products())
}

pub async fn get_product(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    state
        .store
        .get_product(id)
        .map(Json)
        .ok_or_else(|| not_found("product", id))
}

pub async fn create_product(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.store.create_product(req, &admin).map_err(error_response)?;
    metrics::counter!("management.products.created").increment(1);
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    state
        .store
        .update_product(id, req, &admin)
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_product(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    deleted(state.store.delete_product(id, &admin), "management.products.deleted")
}

// ─── Partners ──────────────────────────────────────────────────────────────

pub async fn list_partners(State(state): State<ManagementState>) -> Json<Vec<Partner>> {
    Json(state.store.list_partners())
}

pub async fn get_partner(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Partner>> {
    state
        .store
        .get_partner(id)
        .map(Json)
        .ok_or_else(|| not_found("partner", id))
}

pub async fn create_partner(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Json(req): Json<CreatePartnerRequest>,
) -> ApiResult<(StatusCode, Json<Partner>)> {
    let partner = state.store.create_partner(req, &admin).map_err(error_response)?;
    metrics::counter!("management.partners.created").increment(1);
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn update_partner(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePartnerRequest>,
) -> ApiResult<Json<Partner>> {
    state
        .store
        .update_partner(id, req, &admin)
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_partner(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    deleted(state.store.delete_partner(id, &admin), "management.partners.deleted")
}

// ─── Posts ─────────────────────────────────────────────────────────────────

pub async fn list_posts(State(state): State<ManagementState>) -> Json<Vec<CampaignRecord>> {
    Json(state.store.list_posts())
}

pub async fn get_post(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CampaignRecord>> {
    state
        .store
        .get_post(id)
        .map(Json)
        .ok_or_else(|| not_found("post", id))
}

pub async fn create_post(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<CampaignRecord>)> {
    let post = state.store.create_post(req, &admin).map_err(error_response)?;
    metrics::counter!("management.posts.created").increment(1);
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<CampaignRecord>> {
    state
        .store
        .update_post(id, req, &admin)
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_post(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    deleted(state.store.delete_post(id, &admin), "management.posts.deleted")
}

// ─── Users ─────────────────────────────────────────────────────────────────

pub async fn list_users(State(state): State<ManagementState>) -> Json<Vec<User>> {
    Json(state.store.list_users())
}

pub async fn get_user(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    state
        .store
        .get_user(id)
        .map(Json)
        .ok_or_else(|| not_found("user", id))
}

pub async fn create_user(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.store.create_user(req, &admin).map_err(error_response)?;
    metrics::counter!("management.users.created").increment(1);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    state
        .store
        .update_user(id, req, &admin)
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_user(
    State(state): State<ManagementState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    deleted(state.store.delete_user(id, &admin), "management.users.deleted")
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

pub async fn audit_log(State(state): State<ManagementState>) -> Json<Vec<AuditLogEntry>> {
    Json(state.store.get_audit_log())
}
