use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{Money, OptionId};

/// Optional equipment that can be added to a configuration.
///
/// Which options a trim offers is a catalog relation kept by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentOption {
    pub option_id: OptionId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Money,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}
