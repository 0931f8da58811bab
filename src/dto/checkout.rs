use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::cart::CartEntry;

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutPage {
    pub items: Vec<CartEntry>,
    pub total: Decimal,
    pub balance: Decimal,
}
