use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    dto::account::{
        AccountOverview, AccountQuery, BalanceOverview, DownloadResultQuery, FunctionResultEcho,
        UpdateAccountForm, UseProductForm,
    },
    error::{AppError, AppResult},
    middleware::auth::{self, AuthUser, clear_session_cookie},
    response::ApiResponse,
    services::account_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/account", get(account_overview).post(update_account))
        .route("/account/delete", post(delete_account))
        .route("/use-product", post(use_product))
        .route("/download-function-result", get(download_function_result))
        .route("/balance", get(balance))
}

#[utoipa::path(
    get,
    path = "/account",
    params(
        ("function_result" = Option<String>, Query, description = "Echo of a just-used function product"),
        ("product_name" = Option<String>, Query, description = "Product that produced the result"),
        ("argument" = Option<String>, Query, description = "Argument the function was applied to"),
    ),
    responses(
        (status = 200, description = "Account overview", body = ApiResponse<AccountOverview>),
        (status = 303, description = "Not logged in, redirect to login"),
    ),
    security(("session_cookie" = [])),
    tag = "Account"
)]
pub async fn account_overview(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AccountQuery>,
) -> AppResult<Json<ApiResponse<AccountOverview>>> {
    auth::require_any_role(&state.pool, &user.username, &["user", "admin"]).await?;

    let echo = match (query.function_result, query.product_name, query.argument) {
        (Some(function_result), Some(product_name), Some(argument)) => Some(FunctionResultEcho {
            function_result,
            product_name,
            argument,
        }),
        _ => None,
    };

    let data = account_service::overview(&state.pool, &user.username, echo).await?;
    Ok(Json(ApiResponse::success("Account", data, None)))
}

#[utoipa::path(
    post,
    path = "/account",
    request_body(content = UpdateAccountForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account updated, redirect to account"),
        (status = 400, description = "Validation failed"),
    ),
    security(("session_cookie" = [])),
    tag = "Account"
)]
pub async fn update_account(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<UpdateAccountForm>,
) -> AppResult<Response> {
    auth::require_any_role(&state.pool, &user.username, &["user", "admin"]).await?;
    account_service::update_account(&state.pool, &user.username, form).await?;
    Ok(Redirect::to("/account").into_response())
}

#[utoipa::path(
    post,
    path = "/account/delete",
    responses(
        (status = 303, description = "Account deleted, session cleared, redirect to home"),
    ),
    security(("session_cookie" = [])),
    tag = "Account"
)]
pub async fn delete_account(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    account_service::delete_account(&state.pool, &user.username).await?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/use-product",
    request_body(content = UseProductForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Effect applied, redirect to account (function results ride along as query parameters)"),
        (status = 400, description = "Product not owned or not usable"),
        (status = 404, description = "No such product"),
    ),
    security(("session_cookie" = [])),
    tag = "Account"
)]
pub async fn use_product(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<UseProductForm>,
) -> AppResult<Response> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    let echo = account_service::use_product(&state.pool, &user.username, form).await?;

    let target = match echo {
        Some(echo) => {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("function_result", &echo.function_result)
                .append_pair("product_name", &echo.product_name)
                .append_pair("argument", &echo.argument)
                .finish();
            format!("/account?{query}")
        }
        None => "/account".to_string(),
    };
    Ok(Redirect::to(&target).into_response())
}

#[utoipa::path(
    get,
    path = "/download-function-result",
    params(
        ("function_result" = Option<String>, Query, description = "Result to download"),
        ("product_name" = Option<String>, Query, description = "Product that produced it"),
        ("argument" = Option<String>, Query, description = "Argument it was applied to"),
    ),
    responses(
        (status = 200, description = "Plain-text attachment with the result"),
        (status = 400, description = "Missing parameters"),
    ),
    security(("session_cookie" = [])),
    tag = "Account"
)]
pub async fn download_function_result(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DownloadResultQuery>,
) -> AppResult<Response> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;

    let (function_result, product_name, argument) =
        match (query.function_result, query.product_name, query.argument) {
            (Some(f), Some(p), Some(a)) => (f, p, a),
            _ => {
                return Err(AppError::BadRequest(
                    "Function result or product name not provided.".to_string(),
                ));
            }
        };

    let filename = format!("{product_name}-result-with-arg-{argument}.txt");
    let body = format!(
        "Result for product {product_name} with argument ({argument}): {function_result}"
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/balance",
    responses(
        (status = 200, description = "Current balance and multiplier", body = ApiResponse<BalanceOverview>),
        (status = 303, description = "Not logged in, redirect to login"),
    ),
    security(("session_cookie" = [])),
    tag = "Account"
)]
pub async fn balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BalanceOverview>>> {
    auth::require_any_role(&state.pool, &user.username, &["user"]).await?;
    let data = account_service::balance_overview(&state.pool, &user.username).await?;
    Ok(Json(ApiResponse::success("Balance", data, None)))
}
