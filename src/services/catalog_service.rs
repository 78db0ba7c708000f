use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{
        CreateCategoryRequest, CreateProductRequest, HomeView, ProductDetail,
        UpdateProductRequest,
    },
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
        },
        products::{ActiveModel, Column, DEFAULT_IMAGE, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::HomeQuery,
    state::AppState,
};

/// Products matching the optional name search and category, plus every
/// category for the filter menu.
pub async fn list_products(state: &AppState, query: HomeQuery) -> AppResult<ApiResponse<HomeView>> {
    let search = query.q.unwrap_or_default();
    let category_id = query.category.filter(|c| !c.is_empty());

    let mut condition = Condition::all();
    let mut matches_nothing = false;
    if let Some(raw) = category_id.as_deref() {
        match Uuid::parse_str(raw) {
            Ok(id) => condition = condition.add(Column::CategoryId.eq(id)),
            // no category has this id, so no product can match it
            Err(_) => matches_nothing = true,
        }
    }

    // SQL LOWER() folds ASCII only on SQLite, so the name match runs here with
    // the same Unicode folding applied to both sides.
    let needle = search.to_lowercase();
    let products: Vec<Product> = if matches_nothing {
        Vec::new()
    } else {
        Products::find()
            .filter(condition)
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&state.orm)
            .await?
            .into_iter()
            .filter(|product| name_matches(&product.name, &needle))
            .map(Product::from)
            .collect()
    };

    let categories = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    tracing::debug!(q = %search, category = ?category_id, found = products.len(), "product listing");

    let meta = Meta::new(products.len() as i64);
    let data = HomeView {
        products,
        categories,
        query: search,
        category_id,
    };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let result = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?;
    let (product, category) = match result {
        Some((p, Some(c))) => (p, c),
        _ => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product.into(),
            category: category.into(),
        },
        None,
    ))
}

/// Fails on a duplicate name through the storage constraint.
pub async fn create_category(
    state: &AppState,
    payload: CreateCategoryRequest,
) -> AppResult<Category> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "category created");
    Ok(category.into())
}

pub async fn create_product(state: &AppState, payload: CreateProductRequest) -> AppResult<Product> {
    let category = Categories::find_by_id(payload.category_id)
        .count(&state.orm)
        .await?;
    if category == 0 {
        return Err(AppError::NotFound);
    }

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image: Set(payload.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string())),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok(product.into())
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }

    let product = active.update(&state.orm).await?;
    tracing::info!(product_id = %product.id, "product updated");
    Ok(product.into())
}

/// Case-insensitive substring test. `needle` must already be lowercased; an
/// empty needle matches every name.
fn name_matches(name: &str, needle: &str) -> bool {
    needle.is_empty() || name.to_lowercase().contains(needle)
}
