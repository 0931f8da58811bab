use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{middleware::auth::OptionalUser, response::ApiResponse};

#[derive(Serialize, ToSchema)]
pub struct HomeData {
    pub username: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing data; anonymous callers are welcome", body = ApiResponse<HomeData>),
    ),
    tag = "Home"
)]
pub async fn home(OptionalUser(username): OptionalUser) -> Json<ApiResponse<HomeData>> {
    Json(ApiResponse::success(
        "Welcome",
        HomeData { username },
        None,
    ))
}
