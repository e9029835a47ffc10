pub mod audit_logs;
pub mod customers;
pub mod history_items;
pub mod order_items;
pub mod order_state;
pub mod orders;
pub mod pickup_locations;
pub mod products;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use customers::Entity as Customers;
pub use history_items::Entity as HistoryItems;
pub use order_items::Entity as OrderItems;
pub use order_state::OrderState;
pub use orders::Entity as Orders;
pub use pickup_locations::Entity as PickupLocations;
pub use products::Entity as Products;
pub use users::Entity as Users;
