use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{BrandId, GenerationId, ModelId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub brand_id: BrandId,
    pub name: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// A model line of a brand (e.g. "Camry").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarModel {
    pub model_id: ModelId,
    pub brand_id: BrandId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A production generation of a model. `year_to` is open while in production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub generation_id: GenerationId,
    pub model_id: ModelId,
    pub name: String,
    pub year_from: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Generation {
    pub fn in_production(&self) -> bool {
        self.year_to.is_none()
    }
}
