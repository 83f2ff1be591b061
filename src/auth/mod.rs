use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub use claims::{Claims, Role};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
}
