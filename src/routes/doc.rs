use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        account::{
            AccountOverview, BalanceOverview, FunctionResultEcho, LeaderboardEntry,
            LeaderboardList, OwnedProduct, UpdateAccountForm, UseProductForm,
        },
        admin::{AdminUserRow, RoleChangeRequest, UserList},
        auth::{LoginForm, LoginPageData, SignupForm},
        cart::{AddToCartRequest, CartEntry, CartList},
        checkout::CheckoutPage,
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    middleware::auth::SESSION_COOKIE,
    models::{CartItem, Product, Purchase, Role, User},
    response::{ApiResponse, Meta},
    routes::{account, admin, auth, cart, checkout, health, home, shop},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        home::home,
        auth::signup,
        auth::login_page,
        auth::login,
        auth::logout,
        account::account_overview,
        account::update_account,
        account::delete_account,
        account::use_product,
        account::download_function_result,
        account::balance,
        shop::shop,
        shop::leaderboard,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        checkout::checkout_page,
        checkout::finalize_checkout,
        checkout::purchase_successful,
        admin::create_product,
        admin::get_product,
        admin::update_product,
        admin::delete_product,
        admin::list_users,
        admin::grant_role,
        admin::revoke_role
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            CartItem,
            Purchase,
            SignupForm,
            LoginForm,
            LoginPageData,
            AccountOverview,
            OwnedProduct,
            FunctionResultEcho,
            UpdateAccountForm,
            UseProductForm,
            BalanceOverview,
            LeaderboardEntry,
            LeaderboardList,
            AddToCartRequest,
            CartEntry,
            CartList,
            CheckoutPage,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AdminUserRow,
            UserList,
            RoleChangeRequest,
            home::HomeData,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<CheckoutPage>,
            ApiResponse<AccountOverview>,
            ApiResponse<UserList>
        )
    ),
    security(
        ("session_cookie" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Home", description = "Landing endpoint"),
        (name = "Auth", description = "Signup, login and logout"),
        (name = "Account", description = "Account overview, edits and product usage"),
        (name = "Shop", description = "Product browsing and leaderboard"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Checkout endpoints"),
        (name = "Admin", description = "Product and user administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
