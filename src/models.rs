use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    customers, history_items, order_items, orders, pickup_locations, products, users, OrderState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Price in cents
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PickupLocation {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub state: OrderState,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub paid: bool,
    pub pickup_location_id: Uuid,
    pub customer_id: Uuid,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub comment: Option<String>,
    /// Quantity times unit price in cents
    pub total_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    pub id: Uuid,
    pub message: String,
    pub new_state: Option<OrderState>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Compact order row for the upcoming-orders listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: Uuid,
    pub state: OrderState,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub customer_name: String,
    pub pickup_location: String,
    pub total_price: i64,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role,
            locked: model.locked,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<pickup_locations::Model> for PickupLocation {
    fn from(model: pickup_locations::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<customers::Model> for Customer {
    fn from(model: customers::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            phone_number: model.phone_number,
            details: model.details,
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            state: model.state,
            due_date: model.due_date,
            due_time: model.due_time,
            paid: model.paid,
            pickup_location_id: model.pickup_location_id,
            customer_id: model.customer_id,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            comment: model.comment,
            total_price: model.total_price,
        }
    }
}

impl From<history_items::Model> for HistoryItem {
    fn from(model: history_items::Model) -> Self {
        Self {
            id: model.id,
            message: model.message,
            new_state: model.new_state,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
