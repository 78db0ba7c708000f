use axum_storefront::{
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{self, Entity as Categories},
        products::{self, DEFAULT_IMAGE, Entity as Products},
    },
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let apparel = ensure_category(&orm, "Apparel", "Things to wear").await?;
    let kitchen = ensure_category(&orm, "Kitchen", "Mugs and other vessels").await?;
    let books = ensure_category(&orm, "Books", "Reading material").await?;

    let products = vec![
        (apparel, "Axum Hoodie", "Warm hoodie for Rustaceans", 5500, 50),
        (kitchen, "Ferris Mug", "Coffee tastes better with Ferris", 1200, 100),
        (apparel, "Rust Sticker Pack", "Decorate your laptop", 500, 200),
        (books, "E-book: Async Rust", "Learn async Rust patterns", 2500, 75),
    ];
    for (category_id, name, description, price, stock) in products {
        ensure_product(&orm, category_id, name, description, price, stock).await?;
    }

    println!("Seed completed");
    Ok(())
}

async fn ensure_category(
    orm: &DatabaseConnection,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Categories::find()
        .filter(categories::Column::Name.eq(name))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(description.to_string())),
    }
    .insert(orm)
    .await?;

    println!("Ensured category {name}");
    Ok(category.id)
}

async fn ensure_product(
    orm: &DatabaseConnection,
    category_id: Uuid,
    name: &str,
    description: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<()> {
    let exists = Products::find()
        .filter(products::Column::Name.eq(name))
        .one(orm)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    products::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        price: Set(price),
        stock: Set(stock),
        image: Set(DEFAULT_IMAGE.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Seeded product {name}");
    Ok(())
}
