use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use dealroom_core::TransactionId;
use dealroom_transactions::CreateTransaction;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_transaction).get(list_transactions))
        .route("/:id", get(get_transaction))
        .route("/:id/details", patch(merge_details))
        .route("/:id/invite-counterparty", post(invite_counterparty))
}

fn parse_id(raw: &str) -> Result<TransactionId, axum::response::Response> {
    // An unparseable id cannot name a visible transaction.
    raw.parse::<TransactionId>()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("transaction {raw}")))
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let request: dto::CreateTransactionRequest = match dto::parse_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let request = match CreateTransaction::try_from(request) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.lifecycle.create_transaction(ctx.actor(), &request) {
        Ok(record) => (StatusCode::CREATED, Json(dto::transaction_to_json(&record))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.lifecycle.list_transactions(ctx.actor()) {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.get_transaction(id, ctx.actor()) {
        Ok(record) => (StatusCode::OK, Json(dto::transaction_to_json(&record))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn merge_details(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = match dto::parse_details_patch(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.lifecycle.merge_details(id, ctx.actor(), patch) {
        Ok(record) => (StatusCode::OK, Json(dto::transaction_to_json(&record))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn invite_counterparty(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request: dto::InviteCounterpartyRequest = match dto::parse_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services
        .lifecycle
        .invite_counterparty(id, ctx.actor(), &request.counterparty_email)
    {
        Ok(invited) => (StatusCode::CREATED, Json(dto::counterparty_invited_to_json(&invited))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
