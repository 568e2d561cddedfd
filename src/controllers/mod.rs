pub mod halls;
pub mod seats;
pub mod shows;
pub mod tickets;
pub mod users;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(users::routes())
        .merge(halls::routes())
        .merge(shows::routes())
        .merge(seats::routes())
        .merge(tickets::routes())
}
