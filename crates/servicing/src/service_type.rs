use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{Money, ServiceTypeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub service_type_id: ServiceTypeId,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}
