use sea_orm::entity::prelude::*;

use super::order_state::OrderState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub state: OrderState,
    pub due_date: Date,
    pub due_time: Time,
    pub pickup_location_id: Uuid,
    pub customer_id: Uuid,
    pub paid: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(
        belongs_to = "super::pickup_locations::Entity",
        from = "Column::PickupLocationId",
        to = "super::pickup_locations::Column::Id"
    )]
    PickupLocations,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::history_items::Entity")]
    HistoryItems,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::pickup_locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickupLocations.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::history_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HistoryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
