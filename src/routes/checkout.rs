use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    dto::checkout::CheckoutPage,
    error::AppResult,
    middleware::auth::{self, AuthUser},
    response::{ApiResponse, Meta},
    services::checkout_service::{self, CheckoutOutcome},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout_page).post(finalize_checkout))
        .route("/purchase-successful", get(purchase_successful))
}

#[utoipa::path(
    get,
    path = "/checkout",
    responses(
        (status = 200, description = "Cart entries, computed total and current balance", body = ApiResponse<CheckoutPage>),
        (status = 303, description = "Not logged in, redirect to login"),
    ),
    security(("session_cookie" = [])),
    tag = "Checkout"
)]
pub async fn checkout_page(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutPage>>> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    let data = checkout_service::preview(&state, &user.username).await?;
    Ok(Json(ApiResponse::success("Checkout", data, None)))
}

#[utoipa::path(
    post,
    path = "/checkout",
    responses(
        (status = 303, description = "Redirect to purchase-successful, or back to checkout with an error message"),
    ),
    security(("session_cookie" = [])),
    tag = "Checkout"
)]
pub async fn finalize_checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Response> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;

    let target = match checkout_service::finalize(&state, &user.username).await? {
        CheckoutOutcome::Completed { .. } => "/purchase-successful".to_string(),
        CheckoutOutcome::Rejected { reason } => {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("error", &reason)
                .finish();
            format!("/checkout?{query}")
        }
    };
    Ok(Redirect::to(&target).into_response())
}

#[utoipa::path(
    get,
    path = "/purchase-successful",
    responses(
        (status = 200, description = "Confirmation for the post-checkout redirect", body = ApiResponse<serde_json::Value>),
    ),
    security(("session_cookie" = [])),
    tag = "Checkout"
)]
pub async fn purchase_successful(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    Ok(Json(ApiResponse::success(
        "Purchase successful",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
