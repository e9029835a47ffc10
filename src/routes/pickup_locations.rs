use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::pickup_locations::{CreatePickupLocationRequest, PickupLocationList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PickupLocation,
    response::ApiResponse,
    routes::params::SearchQuery,
    services::pickup_location_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pickup_locations).post(create_pickup_location))
        .route("/default", get(default_pickup_location))
        .route(
            "/{id}",
            get(get_pickup_location).delete(delete_pickup_location),
        )
}

#[utoipa::path(
    get,
    path = "/api/pickup-locations",
    params(SearchQuery),
    responses(
        (status = 200, description = "List pickup locations", body = ApiResponse<PickupLocationList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Pickup locations"
)]
pub async fn list_pickup_locations(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<PickupLocationList>>> {
    let resp = pickup_location_service::list_pickup_locations(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pickup-locations/default",
    responses(
        (status = 200, description = "Location preselected for new orders", body = ApiResponse<PickupLocation>),
        (status = 404, description = "No pickup locations exist")
    ),
    security(("bearer_auth" = [])),
    tag = "Pickup locations"
)]
pub async fn default_pickup_location(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<PickupLocation>>> {
    let resp = pickup_location_service::get_default(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pickup-locations/{id}",
    params(
        ("id" = Uuid, Path, description = "Pickup location ID")
    ),
    responses(
        (status = 200, description = "Get pickup location", body = ApiResponse<PickupLocation>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Pickup locations"
)]
pub async fn get_pickup_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PickupLocation>>> {
    let resp = pickup_location_service::get_pickup_location(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pickup-locations",
    request_body = CreatePickupLocationRequest,
    responses(
        (status = 200, description = "Create pickup location (admin only)", body = ApiResponse<PickupLocation>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = [])),
    tag = "Pickup locations"
)]
pub async fn create_pickup_location(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePickupLocationRequest>,
) -> AppResult<Json<ApiResponse<PickupLocation>>> {
    let resp = pickup_location_service::create_pickup_location(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/pickup-locations/{id}",
    params(
        ("id" = Uuid, Path, description = "Pickup location ID")
    ),
    responses(
        (status = 200, description = "Delete pickup location (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Location is used by orders")
    ),
    security(("bearer_auth" = [])),
    tag = "Pickup locations"
)]
pub async fn delete_pickup_location(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = pickup_location_service::delete_pickup_location(&state, &user, id).await?;
    Ok(Json(resp))
}
