use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderLine, OrderWithItems, PlaceOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        carts::Entity as Carts,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderStatus},
        products::Entity as Products,
    },
    error::{AppError, AppResult, FieldErrors},
    models::{Order, Product},
    response::{ApiResponse, Meta},
    services::pricing,
    state::AppState,
};

/// Turn a cart into an order: one order item per cart item, status Pending.
/// A cart can back at most one order.
pub async fn place_order(
    state: &AppState,
    cart_id: Uuid,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate_customer(&payload)?;

    let txn = state.orm.begin().await?;

    if Carts::find_by_id(cart_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = Orders::find()
        .filter(OrderCol::CartId.eq(cart_id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(AppError::BadRequest("Cart already has an order".into()));
    }

    let cart_items = CartItems::find()
        .filter(CartCol::CartId.eq(cart_id))
        .all(&txn)
        .await?;
    if cart_items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        customer_name: Set(payload.customer_name.trim().to_string()),
        customer_email: Set(payload.customer_email.trim().to_string()),
        shipping_address: Set(payload.shipping_address.trim().to_string()),
        status: Set(OrderStatus::default()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for item in &cart_items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, %cart_id, items = cart_items.len(), "order placed");

    let placed = load_order(state, order.id).await?;
    Ok(ApiResponse::success("Order placed", placed, Some(Meta::empty())))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = load_order(state, id).await?;
    let meta = Meta::new(order.items.len() as i64);
    Ok(ApiResponse::success("OK", order, Some(meta)))
}

/// Any status may follow any other.
pub async fn update_order_status(
    state: &AppState,
    id: Uuid,
    status: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let previous = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(order_id = %order.id, from = ?previous, to = ?status, "order status updated");
    Ok(ApiResponse::success(
        "Updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Order with lines priced at the products' current prices.
async fn load_order(state: &AppState, id: Uuid) -> AppResult<OrderWithItems> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::Id)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items: Vec<OrderLine> = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let Some(product) = product else { continue };
        items.push(OrderLine {
            id: item.id,
            subtotal: pricing::line_subtotal(product.price, item.quantity)?,
            product: Product::from(product),
            quantity: item.quantity,
        });
    }

    let total = pricing::total(items.iter().map(|line| line.subtotal))?;
    Ok(OrderWithItems {
        order: order.into(),
        items,
        total,
    })
}

fn validate_customer(payload: &PlaceOrderRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if payload.customer_name.trim().is_empty() {
        errors.add("customer_name", "This field is required.");
    }
    if payload.customer_email.trim().is_empty() {
        errors.add("customer_email", "This field is required.");
    } else if !payload.customer_email.contains('@') {
        errors.add("customer_email", "Enter a valid email address.");
    }
    if payload.shipping_address.trim().is_empty() {
        errors.add("shipping_address", "This field is required.");
    }
    errors.into_result()
}
