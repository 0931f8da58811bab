use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductListing, ProductSortBy, SortOrder},
    services::account_service::fetch_user,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// The shop listing. Admin viewers also see out-of-stock products; everyone
/// else gets only what can currently be bought.
pub async fn browse(
    state: &AppState,
    include_out_of_stock: bool,
    listing: ProductListing,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();

    if !include_out_of_stock {
        condition = condition.add(Column::Stock.gt(0));
    }

    if let Some(search) = listing.search.as_ref() {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let sort_col = match listing.sort_by {
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Stock => Column::Stock,
        ProductSortBy::CreatedAt => Column::CreatedAt,
    };

    let mut finder = Products::find().filter(condition);
    finder = match listing.sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(listing.per_page as u64)
        .offset(listing.offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(listing.page, listing.per_page, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    username: &str,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    auth::ensure_admin(&state.pool, username).await?;
    let actor = fetch_user(&state.pool, username).await?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name cannot be empty".into()));
    }

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        name: Set(payload.name.trim().to_string()),
        description: Set(Some(payload.description)),
        price: Set(payload.price),
        stock: Set(payload.stock),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    log_audit(
        &state.pool,
        Some(actor.id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    username: &str,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    auth::ensure_admin(&state.pool, username).await?;
    let actor = fetch_user(&state.pool, username).await?;
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Product name cannot be empty".into()));
        }
    }

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }

    let product = active.update(&state.orm).await?;

    log_audit(
        &state.pool,
        Some(actor.id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    username: &str,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    auth::ensure_admin(&state.pool, username).await?;
    let actor = fetch_user(&state.pool, username).await?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    log_audit(
        &state.pool,
        Some(actor.id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
