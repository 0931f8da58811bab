use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::admin::{RoleChangeRequest, UserList},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::ApiResponse,
    routes::params::UserListQuery,
    services::{admin_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}", put(update_product))
        .route("/products/{id}", delete(delete_product))
        .route("/users", get(list_users))
        .route("/users/{username}/roles", post(grant_role))
        .route("/users/{username}/roles/{role}", delete(revoke_role))
}

#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create_product(&state, &user.username, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_admin(&state.pool, &user.username).await?;
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 400, description = "Empty product name"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user.username, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user.username, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("per_page" = Option<String>, Query, description = "Items per page, default 10, capped at 100"),
        ("q" = Option<String>, Query, description = "Search in username and email"),
    ),
    responses(
        (status = 200, description = "One page of users with their roles", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::list_users(&state, &user.username, query.normalize()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/users/{username}/roles",
    params(
        ("username" = String, Path, description = "Target user")
    ),
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Role granted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "User or role not found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn grant_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
    Json(payload): Json<RoleChangeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::grant_role(&state, &user.username, &username, &payload.role).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{username}/roles/{role}",
    params(
        ("username" = String, Path, description = "Target user"),
        ("role" = String, Path, description = "Role to revoke"),
    ),
    responses(
        (status = 200, description = "Role revoked", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "User or role not found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn revoke_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path((username, role)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::revoke_role(&state, &user.username, &username, &role).await?;
    Ok(Json(resp))
}
