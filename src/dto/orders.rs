use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::OrderState;
use crate::models::{Customer, HistoryItem, Order, OrderItem, OrderSummary, PickupLocation};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CustomerInput {
    pub full_name: String,
    pub phone_number: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub comment: Option<String>,
}

/// Full order contents; on update the items replace the existing ones.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveOrderRequest {
    pub customer: CustomerInput,
    pub pickup_location_id: Uuid,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub state: Option<OrderState>,
    #[serde(default)]
    pub paid: bool,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStateRequest {
    pub state: OrderState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub customer: Customer,
    pub pickup_location: PickupLocation,
    pub items: Vec<OrderItem>,
    pub history: Vec<HistoryItem>,
    pub total_price: i64,
}

/// Defaults for a new order form; nothing is persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDraft {
    pub state: OrderState,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub pickup_location: Option<PickupLocation>,
    pub created_by: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummaryList {
    pub items: Vec<OrderSummary>,
}
