use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use super::auth::{Authenticated, SessionVerifier};
use super::error::ApiError;
use crate::access::RationPortal;
use crate::cards::{ApplicationDetails, CardId, CardUpdate};
use crate::tokens::{DistributionRequest, DistributionSummary};

/// Shared handler state: the capability portal plus session resolution.
#[derive(Clone)]
pub struct ApiState {
    pub portal: Arc<RationPortal>,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl ApiState {
    pub fn new(portal: Arc<RationPortal>, sessions: Arc<dyn SessionVerifier>) -> Self {
        Self { portal, sessions }
    }
}

/// Citizen and administrator routes, nested under `/api`.
pub fn ration_card_router(state: ApiState) -> Router {
    let citizen = Router::new()
        .route("/ration-cards/apply", post(apply_handler))
        .route("/ration-cards/my-card", get(my_card_handler))
        .route("/ration-cards/update", put(update_handler));

    let admin = Router::new()
        .route("/admin/cards", get(list_cards_handler))
        .route("/admin/cards/:card_id", delete(delete_handler))
        .route("/admin/cards/:card_id/approve", put(approve_handler))
        .route("/admin/cards/:card_id/reject", put(reject_handler))
        .route("/admin/cards/:card_id/flag-fake", put(flag_fake_handler))
        .route("/admin/users", get(list_users_handler))
        .route("/admin/distribute-tokens", post(distribute_handler))
        .route("/admin/deliveries", get(deliveries_handler));

    Router::new()
        .nest("/api", citizen.merge(admin))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct DistributionResponse {
    message: String,
    #[serde(flatten)]
    summary: DistributionSummary,
}

pub(crate) async fn apply_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<ApplicationDetails>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(details) = payload?;
    let submission = state
        .portal
        .citizen(&principal)
        .submit_application(details)
        .await?;

    let body = json!({
        "message": "Application submitted",
        "card": submission.card,
        "verification": submission.screening,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub(crate) async fn my_card_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
) -> Result<Response, ApiError> {
    let card = state.portal.citizen(&principal).my_card()?;
    Ok(Json(card).into_response())
}

pub(crate) async fn update_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<CardUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(update) = payload?;
    let card = state.portal.citizen(&principal).update_card(update)?;

    let body = json!({
        "message": "Ration card updated successfully",
        "card": card,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn list_cards_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
) -> Result<Response, ApiError> {
    let cards = state.portal.admin(&principal)?.list_cards()?;
    Ok(Json(cards).into_response())
}

pub(crate) async fn approve_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    Path(card_id): Path<String>,
) -> Result<Response, ApiError> {
    let number = state.portal.admin(&principal)?.approve(&CardId(card_id))?;

    let body = json!({
        "message": "Card approved",
        "card_number": number,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn reject_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    Path(card_id): Path<String>,
) -> Result<Response, ApiError> {
    state.portal.admin(&principal)?.reject(&CardId(card_id))?;
    Ok(Json(json!({ "message": "Card rejected" })).into_response())
}

pub(crate) async fn flag_fake_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    Path(card_id): Path<String>,
) -> Result<Response, ApiError> {
    state.portal.admin(&principal)?.flag_fake(&CardId(card_id))?;
    Ok(Json(json!({ "message": "Card flagged as fake" })).into_response())
}

pub(crate) async fn delete_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    Path(card_id): Path<String>,
) -> Result<Response, ApiError> {
    state
        .portal
        .admin(&principal)?
        .delete_card(&CardId(card_id))?;
    Ok(Json(json!({ "message": "Card deleted" })).into_response())
}

pub(crate) async fn list_users_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
) -> Result<Response, ApiError> {
    let users = state.portal.admin(&principal)?.list_users()?;
    Ok(Json(users).into_response())
}

pub(crate) async fn distribute_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<DistributionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let admin = state.portal.admin(&principal)?;
    let Json(request) = payload?;
    let summary = admin.distribute_tokens(request).await?;

    let body = DistributionResponse {
        message: format!("Tokens sent to {} users", summary.succeeded),
        summary,
    };
    Ok(Json(body).into_response())
}

pub(crate) async fn deliveries_handler(
    State(state): State<ApiState>,
    Authenticated(principal): Authenticated,
) -> Result<Response, ApiError> {
    let records = state.portal.admin(&principal)?.deliveries()?;
    Ok(Json(records).into_response())
}
