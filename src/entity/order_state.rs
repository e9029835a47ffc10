use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "problem")]
    Problem,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderState {
    pub fn label(&self) -> &'static str {
        match self {
            OrderState::New => "new",
            OrderState::Confirmed => "confirmed",
            OrderState::Ready => "ready",
            OrderState::Delivered => "delivered",
            OrderState::Problem => "problem",
            OrderState::Cancelled => "cancelled",
        }
    }

    /// States in which an order due today cannot be handed over yet.
    pub fn not_available() -> Vec<OrderState> {
        OrderState::iter()
            .filter(|state| {
                !matches!(
                    state,
                    OrderState::Delivered | OrderState::Ready | OrderState::Cancelled
                )
            })
            .collect()
    }
}
