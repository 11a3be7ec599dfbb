//! Strongly-typed identifiers used across the domain.
//!
//! Every table in the dealership schema is keyed by a UUID; wrapping each one
//! in its own newtype keeps a `TrimId` from being passed where a `ColorId` is
//! expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Registered platform user (customer or staff).
    UserId,
    "UserId"
);
uuid_newtype!(BrandId, "BrandId");
uuid_newtype!(ModelId, "ModelId");
uuid_newtype!(GenerationId, "GenerationId");
uuid_newtype!(
    /// Purchasable vehicle variant.
    TrimId,
    "TrimId"
);
uuid_newtype!(EngineTypeId, "EngineTypeId");
uuid_newtype!(TransmissionId, "TransmissionId");
uuid_newtype!(DriveTypeId, "DriveTypeId");
uuid_newtype!(ColorId, "ColorId");
uuid_newtype!(OptionId, "OptionId");
uuid_newtype!(ConfigurationId, "ConfigurationId");
uuid_newtype!(OrderId, "OrderId");
uuid_newtype!(UserCarId, "UserCarId");
uuid_newtype!(BranchId, "BranchId");
uuid_newtype!(ServiceTypeId, "ServiceTypeId");
uuid_newtype!(
    /// Service appointment at a branch.
    AppointmentId,
    "AppointmentId"
);
uuid_newtype!(NewsId, "NewsId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_display() {
        let id = TrimId::new();
        let parsed: TrimId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage_with_type_name() {
        let err = "not-a-uuid".parse::<ColorId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("ColorId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let uuid = Uuid::now_v7();
        let json = serde_json::to_value(OrderId::from_uuid(uuid)).unwrap();
        assert_eq!(json, serde_json::Value::String(uuid.to_string()));
    }
}
