use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::account::LeaderboardList,
    dto::products::ProductList,
    error::AppResult,
    middleware::auth::{self, OptionalUser},
    response::ApiResponse,
    routes::params::ShopQuery,
    services::{account_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shop", get(shop))
        .route("/leaderboard", get(leaderboard))
}

#[utoipa::path(
    get,
    path = "/shop",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("per_page" = Option<String>, Query, description = "Items per page, default 10, capped at 100"),
        ("sort_by" = Option<String>, Query, description = "name, price, stock or created_at; anything else means name"),
        ("sort_order" = Option<String>, Query, description = "asc or desc, default asc"),
        ("q" = Option<String>, Query, description = "Search in name and description"),
    ),
    responses(
        (status = 200, description = "One page of products with page math in meta", body = ApiResponse<ProductList>),
    ),
    tag = "Shop"
)]
pub async fn shop(
    State(state): State<AppState>,
    OptionalUser(username): OptionalUser,
    Query(query): Query<ShopQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let listing = query.normalize();
    let is_admin = match username.as_deref() {
        Some(username) => auth::is_in_role(&state.pool, username, "admin").await?,
        None => false,
    };
    let resp = product_service::browse(&state, is_admin, listing).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    responses(
        (status = 200, description = "Top users by balance", body = ApiResponse<LeaderboardList>),
    ),
    tag = "Shop"
)]
pub async fn leaderboard(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<LeaderboardList>>> {
    let items = account_service::leaderboard(&state.pool).await?;
    Ok(Json(ApiResponse::success(
        "Leaderboard",
        LeaderboardList { items },
        None,
    )))
}
