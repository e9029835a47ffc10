use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PickupLocation;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePickupLocationRequest {
    pub name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PickupLocationList {
    #[schema(value_type = Vec<PickupLocation>)]
    pub items: Vec<PickupLocation>,
}
