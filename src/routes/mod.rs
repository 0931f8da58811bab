use axum::{Router, routing::get};

use crate::state::AppState;

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod home;
pub mod params;
pub mod shop;

// Build the application router without binding state; it is provided at the
// top level.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(auth::router())
        .merge(account::router())
        .merge(shop::router())
        .merge(checkout::router())
        .nest("/cart", cart::router())
        .nest("/admin", admin::router())
}
