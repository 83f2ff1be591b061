use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tickets",
            post(handlers::create_ticket).get(handlers::list_tickets),
        )
        .route("/tickets/count", get(handlers::ticket_stats))
        .route(
            "/tickets/:id",
            get(handlers::get_ticket).delete(handlers::delete_ticket),
        )
        .route("/tickets/:id/status", patch(handlers::update_ticket_status))
        .route("/tickets/:id/assign", patch(handlers::assign_ticket))
        .route("/tickets/:id/messages", post(handlers::add_message))
}
