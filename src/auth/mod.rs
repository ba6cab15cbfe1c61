use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod github;
pub mod google;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
