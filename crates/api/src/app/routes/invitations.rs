use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use dealroom_transactions::TransactionView;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/:token/accept", post(accept_invitation))
}

pub async fn accept_invitation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(token): Path<String>,
) -> axum::response::Response {
    let accepted = match services.lifecycle.accept_invitation(&token, ctx.actor()) {
        Ok(accepted) => accepted,
        Err(e) => return errors::lifecycle_error_to_response(e),
    };

    // The caller is now a bound participant, so the detail view is visible.
    match services
        .lifecycle
        .get_transaction(accepted.transaction.id, ctx.actor())
    {
        Ok(record) => (StatusCode::OK, Json(TransactionView::from(&record))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
