use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{DriveTypeId, EngineTypeId, TransmissionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineType {
    pub engine_type_id: EngineTypeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmission {
    pub transmission_id: TransmissionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveType {
    pub drive_type_id: DriveTypeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
