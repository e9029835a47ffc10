use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, Section, SessionInfo},
        dashboard::{DashboardData, DeliveryStats, ProductDeliveries},
        orders::{
            AddCommentRequest, ChangeStateRequest, CustomerInput, OrderDetails, OrderDraft,
            OrderItemInput, OrderList, OrderSummaryList, SaveOrderRequest,
        },
        pickup_locations::{CreatePickupLocationRequest, PickupLocationList},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    entity::OrderState,
    models::{Customer, HistoryItem, Order, OrderItem, OrderSummary, PickupLocation, Product, User},
    response::{ApiResponse, Meta},
    routes::{auth, dashboard, health, orders, params, pickup_locations, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::me,
        orders::list_orders,
        orders::upcoming_orders,
        orders::new_order,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::add_comment,
        orders::change_state,
        dashboard::dashboard,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        pickup_locations::list_pickup_locations,
        pickup_locations::default_pickup_location,
        pickup_locations::get_pickup_location,
        pickup_locations::create_pickup_location,
        pickup_locations::delete_pickup_location
    ),
    components(
        schemas(
            User,
            Product,
            PickupLocation,
            Customer,
            Order,
            OrderItem,
            HistoryItem,
            OrderSummary,
            OrderState,
            LoginRequest,
            LoginResponse,
            Section,
            SessionInfo,
            CustomerInput,
            OrderItemInput,
            SaveOrderRequest,
            AddCommentRequest,
            ChangeStateRequest,
            OrderDetails,
            OrderDraft,
            OrderList,
            OrderSummaryList,
            DashboardData,
            DeliveryStats,
            ProductDeliveries,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            CreatePickupLocationRequest,
            PickupLocationList,
            params::SearchQuery,
            params::OrderListQuery,
            params::DashboardQuery,
            Meta,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>,
            ApiResponse<DashboardData>,
            ApiResponse<ProductList>,
            ApiResponse<UserList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login and session endpoints"),
        (name = "Orders", description = "Storefront order endpoints"),
        (name = "Dashboard", description = "Delivery and sales statistics"),
        (name = "Products", description = "Product endpoints"),
        (name = "Users", description = "User administration endpoints"),
        (name = "Pickup locations", description = "Pickup location endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
