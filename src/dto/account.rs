use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::User;

/// A product the user has bought, with the quantity still available for use
/// (purchased minus recorded uses).
#[derive(Debug, Serialize, ToSchema)]
pub struct OwnedProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct FunctionResultEcho {
    pub function_result: String,
    pub product_name: String,
    pub argument: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountOverview {
    pub user: User,
    pub roles: Vec<String>,
    pub owned_products: Vec<OwnedProduct>,
    pub function_result: Option<FunctionResultEcho>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AccountQuery {
    pub function_result: Option<String>,
    pub product_name: Option<String>,
    pub argument: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UseProductForm {
    pub product_name: String,
    pub argument: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DownloadResultQuery {
    pub function_result: Option<String>,
    pub product_name: Option<String>,
    pub argument: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceOverview {
    pub username: String,
    pub balance: Decimal,
    pub multiplier: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub username: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardList {
    pub items: Vec<LeaderboardEntry>,
}
