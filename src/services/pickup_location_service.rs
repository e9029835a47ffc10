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
    dto::pickup_locations::{CreatePickupLocationRequest, PickupLocationList},
    entity::pickup_locations::{ActiveModel, Column, Entity as PickupLocations, Model as PickupLocationModel},
    error::{AppError, AppResult, translate_constraint_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::PickupLocation,
    response::{ApiResponse, Meta},
    routes::params::{PageRequest, SearchQuery, like_pattern, text_filter},
    state::AppState,
};

pub const DUPLICATE_NAME: &str = "There is already a pickup location with that name.";
pub const LOCATION_IN_USE: &str =
    "The pickup location is used by existing orders and cannot be deleted.";

fn matching(filter: Option<&str>) -> Select<PickupLocations> {
    let finder = PickupLocations::find();
    match filter {
        Some(filter) => finder.filter(Expr::col(Column::Name).ilike(like_pattern(filter))),
        None => finder,
    }
}

pub async fn find_any_matching<C: ConnectionTrait>(
    db: &C,
    filter: Option<&str>,
    page: PageRequest,
) -> AppResult<Vec<PickupLocationModel>> {
    let items = matching(filter)
        .order_by_asc(Column::CreatedAt)
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

/// The first pickup location, used to prefill new orders.
pub async fn find_default<C: ConnectionTrait>(db: &C) -> AppResult<Option<PickupLocationModel>> {
    let first = find_any_matching(db, None, PageRequest::first(1)).await?;
    Ok(first.into_iter().next())
}

pub async fn list_pickup_locations(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<PickupLocationList>> {
    let page = query.page_request();
    let filter = text_filter(query.q.as_deref());

    let total = count_any_matching(&state.orm, filter).await?;
    let items = find_any_matching(&state.orm, filter, page)
        .await?
        .into_iter()
        .map(PickupLocation::from)
        .collect();

    Ok(ApiResponse::success(
        "Pickup locations",
        PickupLocationList { items },
        Some(Meta::for_page(&page, total)),
    ))
}

pub async fn get_default(state: &AppState) -> AppResult<ApiResponse<PickupLocation>> {
    let location = find_default(&state.orm).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::single("Default pickup location", location.into()))
}

pub async fn get_pickup_location(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<PickupLocation>> {
    let location = PickupLocations::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::single("Pickup location", location.into()))
}

pub async fn create_pickup_location(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePickupLocationRequest,
) -> AppResult<ApiResponse<PickupLocation>> {
    ensure_admin(user)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Pickup location name must not be empty".into()));
    }

    let location = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| translate_constraint_violation(err, DUPLICATE_NAME, None))?;

    audit::record(
        &state.pool,
        user.user_id,
        "pickup_location_create",
        "pickup_locations",
        serde_json::json!({ "pickup_location_id": location.id }),
    )
    .await;

    Ok(ApiResponse::single("Pickup location created", location.into()))
}

pub async fn delete_pickup_location(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = PickupLocations::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|err| translate_constraint_violation(err, DUPLICATE_NAME, Some(LOCATION_IN_USE)))?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "pickup_location_delete",
        "pickup_locations",
        serde_json::json!({ "pickup_location_id": id }),
    )
    .await;

    Ok(ApiResponse::single("Deleted", serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn filter_branches() {
        let filtered = matching(Some("Store")).build(DbBackend::Postgres).to_string();
        assert!(filtered.contains("ILIKE '%Store%'"), "{filtered}");

        let all = matching(None).build(DbBackend::Postgres).to_string();
        assert!(!all.contains("ILIKE"), "{all}");
    }
}
