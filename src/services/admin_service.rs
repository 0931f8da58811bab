use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{AdminUserRow, UserList},
    entity::users::{Column, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth,
    response::{ApiResponse, Meta},
    routes::params::UserListing,
    services::account_service::fetch_user,
    state::AppState,
};

/// Paginated, searchable user listing with each user's role names.
pub async fn list_users(
    state: &AppState,
    username: &str,
    listing: UserListing,
) -> AppResult<ApiResponse<UserList>> {
    auth::ensure_admin(&state.pool, username).await?;

    let mut condition = Condition::all();
    if let Some(search) = listing.search.as_ref() {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Username).ilike(pattern.clone()))
                .add(Expr::col(Column::Email).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_asc(Column::Username);

    let total = finder.clone().count(&state.orm).await? as i64;

    let users = finder
        .limit(listing.per_page as u64)
        .offset(listing.offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let mut roles_by_user: HashMap<Uuid, Vec<String>> = HashMap::new();
    if !ids.is_empty() {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT ur.user_id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY r.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&state.pool)
        .await?;
        for (user_id, role) in rows {
            roles_by_user.entry(user_id).or_default().push(role);
        }
    }

    let items = users
        .into_iter()
        .map(|user| AdminUserRow {
            roles: roles_by_user.remove(&user.id).unwrap_or_default(),
            id: user.id,
            username: user.username,
            email: user.email,
            balance: user.balance,
            multiplier: user.multiplier,
            created_at: user.created_at.with_timezone(&Utc),
        })
        .collect();

    let meta = Meta::new(listing.page, listing.per_page, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn grant_role(
    state: &AppState,
    admin_username: &str,
    target_username: &str,
    role: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    auth::ensure_admin(&state.pool, admin_username).await?;
    let actor = fetch_user(&state.pool, admin_username).await?;

    let (user_id, role_id) = lookup_user_and_role(state, target_username, role).await?;

    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(role_id)
        .execute(&state.pool)
        .await?;

    log_audit(
        &state.pool,
        Some(actor.id),
        "role_grant",
        Some("user_roles"),
        Some(serde_json::json!({ "username": target_username, "role": role })),
    )
    .await;

    Ok(ApiResponse::success(
        "Role granted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn revoke_role(
    state: &AppState,
    admin_username: &str,
    target_username: &str,
    role: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    auth::ensure_admin(&state.pool, admin_username).await?;
    let actor = fetch_user(&state.pool, admin_username).await?;

    let (user_id, role_id) = lookup_user_and_role(state, target_username, role).await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
        .bind(user_id)
        .bind(role_id)
        .execute(&state.pool)
        .await?;

    log_audit(
        &state.pool,
        Some(actor.id),
        "role_revoke",
        Some("user_roles"),
        Some(serde_json::json!({ "username": target_username, "role": role })),
    )
    .await;

    Ok(ApiResponse::success(
        "Role revoked",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn lookup_user_and_role(
    state: &AppState,
    username: &str,
    role: &str,
) -> AppResult<(Uuid, Uuid)> {
    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&state.pool)
        .await?;
    let role_row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
        .bind(role)
        .fetch_optional(&state.pool)
        .await?;

    match (user, role_row) {
        (Some((user_id,)), Some((role_id,))) => Ok((user_id, role_id)),
        _ => Err(AppError::BadRequest("User or role not found".to_string())),
    }
}
