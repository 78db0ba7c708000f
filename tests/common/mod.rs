#![allow(dead_code)]

use axum_storefront::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::catalog::{CreateCategoryRequest, CreateProductRequest},
    models::{Category, Product},
    services::catalog_service,
    state::AppState,
};
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-session-secret";

/// Fresh in-memory database per test, fully migrated.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        session_secret: TEST_SECRET.into(),
        session_ttl_hours: 24,
    };
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, &config))
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Category> {
    Ok(catalog_service::create_category(
        state,
        CreateCategoryRequest {
            name: name.into(),
            description: None,
        },
    )
    .await?)
}

pub async fn create_product(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Product> {
    Ok(catalog_service::create_product(
        state,
        CreateProductRequest {
            category_id,
            name: name.into(),
            description: format!("{name} description"),
            price,
            stock: 10,
            image: None,
        },
    )
    .await?)
}
