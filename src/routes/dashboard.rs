use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::dashboard::DashboardData,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::DashboardQuery,
    services::dashboard_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Delivery statistics and sales figures", body = ApiResponse<DashboardData>),
        (status = 400, description = "Invalid month or year"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<DashboardData>>> {
    let resp = dashboard_service::get_dashboard_data(&state, query).await?;
    Ok(Json(resp))
}
