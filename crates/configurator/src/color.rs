use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{ColorId, Money};

/// Paint color. `price_delta` may be negative for discounted colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub color_id: ColorId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_code: Option<String>,
    pub price_delta: Money,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}
