use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeliveryStats {
    pub due_today: u64,
    pub due_tomorrow: u64,
    pub delivered_today: u64,
    pub not_available_today: u64,
    pub new_orders: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDeliveries {
    pub product: Product,
    pub count: i64,
}

/// Chart-ready figures; `null` marks periods without deliveries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardData {
    pub month: u32,
    pub year: i32,
    pub delivery_stats: DeliveryStats,
    /// One slot per day of the month
    pub deliveries_this_month: Vec<Option<i64>>,
    /// One slot per month of the year
    pub deliveries_this_year: Vec<Option<i64>>,
    /// Rows are the year and the two before it, columns are months
    pub sales_per_month: Vec<Vec<Option<i64>>>,
    pub product_deliveries: Vec<ProductDeliveries>,
}
