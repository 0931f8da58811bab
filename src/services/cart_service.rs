use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartEntry, CartList},
    error::{AppError, AppResult},
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i32,
    created_at: DateTime<Utc>,
}

pub async fn cart_entries(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<CartEntry>> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.name, p.description, p.price, p.stock, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CartEntry {
            id: row.cart_id,
            product: Product {
                id: row.product_id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                created_at: row.created_at,
            },
            quantity: row.quantity,
        })
        .collect())
}

pub async fn list_cart(pool: &DbPool, user_id: Uuid) -> AppResult<ApiResponse<CartList>> {
    let items = cart_entries(pool, user_id).await?;
    Ok(ApiResponse::success("OK", CartList { items }, None))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user_id: Uuid,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let exist: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;

    let cart_item = if let Some(item) = exist {
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(user_id)
        .bind(payload.quantity)
        .fetch_one(pool)
        .await?
    } else {
        sqlx::query_as(
            "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(payload.product_id)
        .bind(payload.quantity)
        .fetch_one(pool)
        .await?
    };

    log_audit(
        pool,
        Some(user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await;
    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    log_audit(
        pool,
        Some(user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
