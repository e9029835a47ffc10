pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod pickup_locations;
pub mod products;
pub mod users;
