use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::cart::CartView,
    error::AppResult,
    middleware::session::SessionToken,
    response::ApiResponse,
    routes::params::ResourceId,
    services::{cart_service, session_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart_detail))
        .route("/cart/add/{product_id}", get(add_to_cart).post(add_to_cart))
        .route(
            "/cart/remove/{item_id}",
            get(remove_from_cart).post(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "The session's cart with line subtotals and total", body = ApiResponse<CartView>)
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn cart_detail(
    State(state): State<AppState>,
    session: SessionToken,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/add/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 303, description = "Item added, redirect to the cart"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: SessionToken,
    ResourceId(product_id): ResourceId,
) -> AppResult<impl IntoResponse> {
    let bound = cart_service::add_to_cart(&state, session, product_id).await?;
    let cookie = session_service::cookie_for(&state, &bound)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/cart")))
}

#[utoipa::path(
    post,
    path = "/cart/remove/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 303, description = "Item removed, redirect to the cart"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: SessionToken,
    ResourceId(item_id): ResourceId,
) -> AppResult<Redirect> {
    cart_service::remove_from_cart(&state, session, item_id).await?;
    Ok(Redirect::to("/cart"))
}
