use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{HomeView, ProductDetail},
    error::AppResult,
    response::ApiResponse,
    routes::params::{HomeQuery, ResourceId},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/product/{id}", get(product_detail))
}

#[utoipa::path(
    get,
    path = "/",
    params(
        ("q" = Option<String>, Query, description = "Case-insensitive substring of the product name"),
        ("category" = Option<String>, Query, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Product listing with categories", body = ApiResponse<HomeView>)
    ),
    tag = "Catalog"
)]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> AppResult<Json<ApiResponse<HomeView>>> {
    let resp = catalog_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found or malformed id"),
    ),
    tag = "Catalog"
)]
pub async fn product_detail(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::get_product(&state, id).await?;
    Ok(Json(resp))
}
