use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Cart, Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartDetail {
    pub cart: Cart,
    pub items: Vec<CartLine>,
    pub total: i64,
}

/// `cart` is null until the visitor adds something.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart: Option<CartDetail>,
}
