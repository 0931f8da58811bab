use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::checkout::CheckoutPage,
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products},
        purchases::ActiveModel as PurchaseActive,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    services::{account_service::fetch_user, cart_service::cart_entries},
    state::AppState,
};

/// Result of a finalize attempt. A rejection leaves the store untouched; the
/// caller sends the user back to the checkout page with the reason.
#[derive(Debug)]
pub enum CheckoutOutcome {
    Completed { total: Decimal },
    Rejected { reason: String },
}

pub async fn preview(state: &AppState, username: &str) -> AppResult<CheckoutPage> {
    let user = fetch_user(&state.pool, username).await?;
    let items = cart_entries(&state.pool, user.id).await?;
    let total = items
        .iter()
        .map(|entry| entry.product.price * Decimal::from(entry.quantity))
        .sum();
    Ok(CheckoutPage {
        items,
        total,
        balance: user.balance,
    })
}

/// Settle the cart against the stored balance. Purchase rows record the
/// price at purchase time; the whole settlement is one transaction.
pub async fn finalize(state: &AppState, username: &str) -> AppResult<CheckoutOutcome> {
    let txn = state.orm.begin().await?;

    let user = Users::find()
        .filter(UserCol::Username.eq(username))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Ok(CheckoutOutcome::Rejected {
            reason: "Your cart is empty".to_string(),
        });
    }

    let product_ids: Vec<Uuid> = cart.iter().map(|item| item.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(cart.len());
    for item in &cart {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart references missing product")))?;
        if product.stock < item.quantity {
            return Ok(CheckoutOutcome::Rejected {
                reason: format!("Insufficient stock for {}", product.name),
            });
        }
        total += product.price * Decimal::from(item.quantity);
        lines.push((item, product.price));
    }

    if user.balance < total {
        return Ok(CheckoutOutcome::Rejected {
            reason: "Insufficient funds to complete the purchase".to_string(),
        });
    }

    let user_id = user.id;
    let new_balance = user.balance - total;
    let mut active: UserActive = user.into();
    active.balance = Set(new_balance);
    active.update(&txn).await?;

    for (item, price) in &lines {
        PurchaseActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(*price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    log_audit(
        &state.pool,
        Some(user_id),
        "checkout",
        Some("purchases"),
        Some(serde_json::json!({ "total": total.to_string() })),
    )
    .await;

    Ok(CheckoutOutcome::Completed { total })
}
