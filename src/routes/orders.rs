use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        AddCommentRequest, ChangeStateRequest, OrderDetails, OrderDraft, OrderList,
        OrderSummaryList, SaveOrderRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/new", get(new_order))
        .route("/upcoming", get(upcoming_orders))
        .route("/{id}", get(get_order).put(update_order))
        .route("/{id}/comments", post(add_comment))
        .route("/{id}/state", patch(change_state))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders matching the customer and due date filters", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/upcoming",
    responses(
        (status = 200, description = "Summaries of orders due today or later", body = ApiResponse<OrderSummaryList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn upcoming_orders(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderSummaryList>>> {
    let resp = order_service::list_upcoming(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/new",
    responses(
        (status = 200, description = "Defaults for a new order", body = ApiResponse<OrderDraft>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn new_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderDraft>>> {
    let resp = order_service::create_new(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = SaveOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<OrderDetails>),
        (status = 400, description = "Invalid order"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SaveOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let resp = order_service::save_order(&state, &user, None, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with customer, items and history", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = SaveOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderDetails>),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let resp = order_service::save_order(&state, &user, Some(id), payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = AddCommentRequest,
    responses(
        (status = 200, description = "Comment added to the order history", body = ApiResponse<OrderDetails>),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let resp = order_service::add_comment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/state",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = ChangeStateRequest,
    responses(
        (status = 200, description = "Order state changed", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn change_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStateRequest>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let resp = order_service::change_state(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
