use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiDocument,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{FormView, LoginForm, RegisterForm},
        cart::{CartDetail, CartLine, CartView},
        catalog::{HomeView, ProductDetail},
    },
    entity::orders::OrderStatus,
    error::FieldErrors,
    middleware::session::SESSION_COOKIE,
    models::{Cart, Category, Order, Product, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, params, products},
};

struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
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
        products::home,
        products::product_detail,
        cart::cart_detail,
        cart::add_to_cart,
        cart::remove_from_cart,
        auth::register_form,
        auth::register,
        auth::login_form,
        auth::login,
        auth::logout
    ),
    components(
        schemas(
            Category,
            Product,
            Cart,
            Order,
            OrderStatus,
            User,
            HomeView,
            ProductDetail,
            CartLine,
            CartDetail,
            CartView,
            FormView,
            RegisterForm,
            LoginForm,
            FieldErrors,
            params::HomeQuery,
            Meta,
            ApiResponse<HomeView>,
            ApiResponse<ProductDetail>,
            ApiResponse<CartView>,
            ApiResponse<FormView>
        )
    ),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Product listing and detail"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Auth", description = "Registration, login and logout"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiDocument> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
