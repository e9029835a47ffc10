use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult, translate_constraint_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{PageRequest, SearchQuery, like_pattern, text_filter},
    state::AppState,
};

pub const DUPLICATE_NAME: &str =
    "There is already a product with that name. Please select a unique name for the product.";
pub const PRODUCT_IN_USE: &str =
    "The product is part of existing orders and cannot be deleted.";

fn matching(filter: Option<&str>) -> Select<Products> {
    let finder = Products::find();
    match filter {
        Some(filter) => finder.filter(Expr::col(Column::Name).ilike(like_pattern(filter))),
        None => finder,
    }
}

pub async fn find_any_matching<C: ConnectionTrait>(
    db: &C,
    filter: Option<&str>,
    page: PageRequest,
) -> AppResult<Vec<ProductModel>> {
    let items = matching(filter)
        .order_by_asc(Column::Name)
        .limit(page.limit())
        .offset(page.offset())
        .all(db)
        .await?;
    Ok(items)
}

pub async fn count_any_matching<C: ConnectionTrait>(db: &C, filter: Option<&str>) -> AppResult<u64> {
    Ok(matching(filter).count(db).await?)
}

pub async fn list_products(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let page = query.page_request();
    let filter = text_filter(query.q.as_deref());

    let total = count_any_matching(&state.orm, filter).await?;
    let items = find_any_matching(&state.orm, filter, page)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::for_page(&page, total)),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let name = validate_name(&payload.name)?;
    validate_price(payload.price)?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        price: Set(payload.price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| translate_constraint_violation(err, DUPLICATE_NAME, None))?;

    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::single("Product created", product.into()))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(validate_name(&name)?);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }

    let product = active
        .update(&state.orm)
        .await
        .map_err(|err| translate_constraint_violation(err, DUPLICATE_NAME, None))?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::single("Updated", product.into()))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|err| translate_constraint_violation(err, DUPLICATE_NAME, Some(PRODUCT_IN_USE)))?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::single("Deleted", serde_json::json!({})))
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name must not be empty".into()));
    }
    Ok(name.to_string())
}

/// Highest accepted price in cents.
pub const MAX_PRICE: i64 = i32::MAX as i64;

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if price > MAX_PRICE {
        return Err(AppError::BadRequest(format!(
            "Price must not exceed {MAX_PRICE} cents"
        )));
    }
    Ok(())
}
