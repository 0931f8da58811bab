use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginForm, LoginPageData, LoginQuery, SignupForm},
    error::AppResult,
    middleware::auth::{clear_session_cookie, session_cookie},
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

#[utoipa::path(
    get,
    path = "/login",
    params(
        ("returnUrl" = Option<String>, Query, description = "Local path to return to after login"),
        ("message" = Option<String>, Query, description = "Message to show on the form"),
    ),
    responses(
        (status = 200, description = "Login form data", body = ApiResponse<LoginPageData>),
    ),
    tag = "Auth"
)]
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<ApiResponse<LoginPageData>> {
    Json(ApiResponse::success(
        "Login",
        LoginPageData {
            message: query.message,
            return_url: query.return_url,
        },
        None,
    ))
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created, session established, redirect to account"),
        (status = 400, description = "Validation failed; every violated rule is reported"),
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = auth_service::signup(&state.pool, form).await?;
    let cookie = session_cookie(&username)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to("/account"),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/login",
    params(
        ("returnUrl" = Option<String>, Query, description = "Local path to return to after login")
    ),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Session established, redirect to returnUrl or home"),
        (status = 400, description = "Wrong username or password"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = auth_service::login(&state.pool, form).await?;
    let cookie = session_cookie(&username)?;

    // Only local paths; an absolute returnUrl would be an open redirect.
    let target = query
        .return_url
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| "/".to_string());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(&target),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to home"),
    ),
    tag = "Auth"
)]
pub async fn logout() -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}
