use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    error::AppResult,
    middleware::auth::{self, AuthUser},
    models::CartItem,
    response::ApiResponse,
    services::{account_service, cart_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route("/{product_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart entries with product data", body = ApiResponse<CartList>),
        (status = 303, description = "Not logged in, redirect to login"),
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    let account = account_service::fetch_user(&state.pool, &user.username).await?;
    let resp = cart_service::list_cart(&state.pool, account.id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Cart entry added or quantity replaced", body = ApiResponse<CartItem>),
        (status = 400, description = "Unknown product or non-positive quantity"),
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    let account = account_service::fetch_user(&state.pool, &user.username).await?;
    let resp = cart_service::add_to_cart(&state.pool, account.id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product to drop from the cart")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Nothing to remove"),
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    let account = account_service::fetch_user(&state.pool, &user.username).await?;
    let resp = cart_service::remove_from_cart(&state.pool, account.id, product_id).await?;
    Ok(Json(resp))
}
