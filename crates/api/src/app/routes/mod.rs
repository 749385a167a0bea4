use axum::{Router, routing::get};

pub mod invitations;
pub mod system;
pub mod transactions;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/transactions", transactions::router())
        .nest("/invitations", invitations::router())
}
