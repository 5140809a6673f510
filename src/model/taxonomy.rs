use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::category::Model as CategoryModel;
use crate::entity::location::Model as LocationModel;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationCreateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    pub parent_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub postal_code: Option<String>,
    pub population: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub color_code: Option<String>,
    pub icon_name: Option<String>,
    pub parent_id: Option<i32>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReparentRequest {
    pub parent_id: Option<i32>,
}

/// Filters shared by location and category listings. Inactive nodes are hidden by default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeQuery {
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub parent_id: Option<i32>,
    pub roots_only: Option<bool>,
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    pub parent_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub postal_code: Option<String>,
    pub population: Option<i32>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<LocationModel> for LocationResponse {
    fn from(model: LocationModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            location_type: model.location_type,
            parent_id: model.parent_id,
            latitude: model.latitude,
            longitude: model.longitude,
            postal_code: model.postal_code,
            population: model.population,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color_code: Option<String>,
    pub icon_name: Option<String>,
    pub parent_id: Option<i32>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            color_code: model.color_code,
            icon_name: model.icon_name,
            parent_id: model.parent_id,
            is_active: model.is_active,
            sort_order: model.sort_order,
            created_at: model.created_at,
        }
    }
}
