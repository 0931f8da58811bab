use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct SignupForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LoginPageData {
    pub message: Option<String>,
    pub return_url: Option<String>,
}
