use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::cart::{CartDetail, CartLine, CartView},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Entity as Carts},
        products::Entity as Products,
        sessions::Model as SessionModel,
    },
    error::{AppError, AppResult},
    middleware::session::SessionToken,
    models::Product,
    response::{ApiResponse, Meta},
    services::{pricing, session_service},
    state::AppState,
};

/// Put one more unit of `product_id` into the session's cart, creating the
/// cart (and the session) on first use. Returns the session so the caller can
/// refresh its cookie.
pub async fn add_to_cart(
    state: &AppState,
    token: SessionToken,
    product_id: Uuid,
) -> AppResult<SessionModel> {
    let product_exists = Products::find_by_id(product_id).count(&state.orm).await?;
    if product_exists == 0 {
        return Err(AppError::NotFound);
    }

    let session = session_service::resolve(state, token).await?;
    let bound_cart = match session.as_ref().and_then(|s| s.cart_id) {
        Some(cart_id) => Carts::find_by_id(cart_id).one(&state.orm).await?,
        None => None,
    };
    let cart_id = match bound_cart {
        Some(cart) => cart.id,
        None => create_cart(state).await?,
    };
    let session = session_service::bind_cart(state, session, cart_id).await?;

    // Single statement so concurrent adds of the same product cannot create
    // a second row or lose an increment.
    CartItems::insert(CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        product_id: Set(product_id),
        quantity: Set(1),
    })
    .on_conflict(
        OnConflict::columns([CartCol::CartId, CartCol::ProductId])
            .value(
                CartCol::Quantity,
                Expr::col((CartItems, CartCol::Quantity)).add(1),
            )
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    tracing::info!(%cart_id, %product_id, "added to cart");
    Ok(session)
}

pub async fn view_cart(state: &AppState, token: SessionToken) -> AppResult<ApiResponse<CartView>> {
    let session = session_service::resolve(state, token).await?;
    let cart = match session.and_then(|s| s.cart_id) {
        Some(cart_id) => Carts::find_by_id(cart_id).one(&state.orm).await?,
        None => None,
    };
    let Some(cart) = cart else {
        return Ok(ApiResponse::success(
            "Cart",
            CartView { cart: None },
            Some(Meta::empty()),
        ));
    };

    let rows = CartItems::find()
        .filter(CartCol::CartId.eq(cart.id))
        .order_by_asc(CartCol::Id)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items: Vec<CartLine> = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let Some(product) = product else { continue };
        items.push(CartLine {
            id: item.id,
            subtotal: pricing::line_subtotal(product.price, item.quantity)?,
            product: Product::from(product),
            quantity: item.quantity,
        });
    }

    let total = pricing::total(items.iter().map(|line| line.subtotal))?;
    let meta = Meta::new(items.len() as i64);
    Ok(ApiResponse::success(
        "Cart",
        CartView {
            cart: Some(CartDetail {
                cart: cart.into(),
                items,
                total,
            }),
        },
        Some(meta),
    ))
}

/// Delete a cart item. Items outside the caller's own cart are reported as
/// missing.
pub async fn remove_from_cart(
    state: &AppState,
    token: SessionToken,
    item_id: Uuid,
) -> AppResult<()> {
    let item = CartItems::find_by_id(item_id).one(&state.orm).await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let session = session_service::resolve(state, token).await?;
    if session.and_then(|s| s.cart_id) != Some(item.cart_id) {
        tracing::warn!(%item_id, "refused to remove item from another cart");
        return Err(AppError::NotFound);
    }

    let result = CartItems::delete_by_id(item.id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(%item_id, cart_id = %item.cart_id, "removed from cart");
    Ok(())
}

async fn create_cart(state: &AppState) -> AppResult<Uuid> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(cart_id = %cart.id, "cart created");
    Ok(cart.id)
}
