use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::account::{
        AccountOverview, BalanceOverview, FunctionResultEcho, LeaderboardEntry, OwnedProduct,
        UpdateAccountForm, UseProductForm,
    },
    effects::{self, ProductEffect},
    error::{AppError, AppResult},
    middleware::auth,
    models::User,
    services::auth_service::hash_password,
};

pub async fn fetch_user(pool: &DbPool, username: &str) -> AppResult<User> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    user.ok_or(AppError::NotFound)
}

#[derive(FromRow)]
struct OwnedProductRow {
    product_id: Uuid,
    name: String,
    purchased: i64,
    used: i64,
}

/// Purchases aggregated per product, minus recorded uses.
pub async fn owned_products(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<OwnedProduct>> {
    let rows: Vec<OwnedProductRow> = sqlx::query_as(
        r#"
        SELECT pr.id AS product_id,
               pr.name,
               SUM(pu.quantity)::BIGINT AS purchased,
               (SELECT COUNT(*) FROM product_uses x
                 WHERE x.user_id = pu.user_id AND x.product_id = pr.id) AS used
        FROM purchases pu
        JOIN products pr ON pr.id = pu.product_id
        WHERE pu.user_id = $1
        GROUP BY pr.id, pr.name, pu.user_id
        ORDER BY pr.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OwnedProduct {
            product_id: row.product_id,
            name: row.name,
            quantity: row.purchased - row.used,
        })
        .collect())
}

pub async fn overview(
    pool: &DbPool,
    username: &str,
    function_result: Option<FunctionResultEcho>,
) -> AppResult<AccountOverview> {
    let user = fetch_user(pool, username).await?;
    let roles = auth::user_roles(pool, username).await?;
    let owned_products = owned_products(pool, user.id).await?;
    Ok(AccountOverview {
        user,
        roles,
        owned_products,
        function_result,
    })
}

/// Violations for the edit form. Both fields are optional; a provided value
/// still has to pass the signup rules.
pub fn update_violations(
    email: Option<&str>,
    password: Option<&str>,
    confirm_password: Option<&str>,
) -> Vec<String> {
    let mut messages = Vec::new();
    if let Some(email) = email {
        if email.len() < 6 {
            messages.push("An invalid email was provided".to_string());
        }
    }
    if password.is_some() || confirm_password.is_some() {
        if password.map_or(true, |p| p.len() < 6) {
            messages.push("Password should be longer than 5 characters".to_string());
        }
        if password != confirm_password {
            messages.push("The passwords given are different".to_string());
        }
    }
    messages
}

pub async fn update_account(
    pool: &DbPool,
    username: &str,
    form: UpdateAccountForm,
) -> AppResult<()> {
    let email = form.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let password = form
        .password
        .as_deref()
        .filter(|p| !p.is_empty());
    let confirm_password = form
        .confirm_password
        .as_deref()
        .filter(|p| !p.is_empty());

    let violations = update_violations(email, password, confirm_password);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let user = fetch_user(pool, username).await?;

    if let Some(email) = email {
        sqlx::query("UPDATE users SET email = $2 WHERE id = $1")
            .bind(user.id)
            .bind(email)
            .execute(pool)
            .await?;
    }
    if let Some(password) = password {
        let password_hash = hash_password(password)?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user.id)
            .bind(password_hash)
            .execute(pool)
            .await?;
    }

    log_audit(
        pool,
        Some(user.id),
        "account_update",
        Some("users"),
        None,
    )
    .await;

    Ok(())
}

/// Role memberships, cart entries, purchases and usage records go with the
/// account via foreign key cascade; audit rows keep a nulled user reference.
pub async fn delete_account(pool: &DbPool, username: &str) -> AppResult<()> {
    let user = fetch_user(pool, username).await?;

    log_audit(
        pool,
        Some(user.id),
        "account_delete",
        Some("users"),
        Some(serde_json::json!({ "username": username })),
    )
    .await;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Apply an owned product's effect and record the use. Function products
/// return a result for the account page to echo and offer as a download.
pub async fn use_product(
    pool: &DbPool,
    username: &str,
    form: UseProductForm,
) -> AppResult<Option<FunctionResultEcho>> {
    let user = fetch_user(pool, username).await?;

    let product: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
        .bind(form.product_name.as_str())
        .fetch_optional(pool)
        .await?;
    let (product_id,) = product.ok_or(AppError::NotFound)?;

    let remaining = owned_products(pool, user.id)
        .await?
        .into_iter()
        .find(|owned| owned.product_id == product_id)
        .map(|owned| owned.quantity)
        .unwrap_or(0);
    if remaining <= 0 {
        return Err(AppError::BadRequest(
            "You do not own this product".to_string(),
        ));
    }

    let echo = match effects::parse_product_name(&form.product_name) {
        Some(ProductEffect::Multiplier(value)) => {
            sqlx::query("UPDATE users SET multiplier = multiplier + $2 WHERE id = $1")
                .bind(user.id)
                .bind(value)
                .execute(pool)
                .await?;
            None
        }
        Some(ProductEffect::Function(function)) => {
            let argument = form.argument.clone().unwrap_or_default();
            Some(FunctionResultEcho {
                function_result: function.apply(&argument),
                product_name: form.product_name.clone(),
                argument,
            })
        }
        None => {
            return Err(AppError::BadRequest(
                "This product cannot be used".to_string(),
            ));
        }
    };

    sqlx::query("INSERT INTO product_uses (user_id, product_id) VALUES ($1, $2)")
        .bind(user.id)
        .bind(product_id)
        .execute(pool)
        .await?;

    log_audit(
        pool,
        Some(user.id),
        "product_use",
        Some("products"),
        Some(serde_json::json!({ "product_name": form.product_name })),
    )
    .await;

    Ok(echo)
}

pub async fn balance_overview(pool: &DbPool, username: &str) -> AppResult<BalanceOverview> {
    let user = fetch_user(pool, username).await?;
    Ok(BalanceOverview {
        username: user.username,
        balance: user.balance,
        multiplier: user.multiplier,
    })
}

pub async fn leaderboard(pool: &DbPool) -> AppResult<Vec<LeaderboardEntry>> {
    let rows: Vec<(String, Decimal)> =
        sqlx::query_as("SELECT username, balance FROM users ORDER BY balance DESC LIMIT 10")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(username, balance)| LeaderboardEntry { username, balance })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_edit_form_is_valid() {
        assert!(update_violations(None, None, None).is_empty());
    }

    #[test]
    fn short_email_is_rejected() {
        let violations = update_violations(Some("a@b.c"), None, None);
        assert_eq!(violations, vec!["An invalid email was provided"]);
    }

    #[test]
    fn password_change_requires_matching_confirmation() {
        let violations = update_violations(None, Some("secret1"), Some("secret2"));
        assert_eq!(violations, vec!["The passwords given are different"]);
    }

    #[test]
    fn short_password_and_mismatch_are_both_reported() {
        let violations = update_violations(None, Some("pw"), Some("other"));
        assert_eq!(violations.len(), 2);
    }
}
