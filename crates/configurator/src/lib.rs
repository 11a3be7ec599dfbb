//! Vehicle configurator: colors, options, saved configurations, and the
//! rules for pricing them and moving them through their lifecycle.
//!
//! Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod color;
pub mod configuration;
pub mod error;
pub mod option;
pub mod pricing;

pub use color::Color;
pub use configuration::{
    Configuration, ConfigurationDetails, ConfigurationDraft, ConfigurationStatus,
};
pub use error::ConfiguratorError;
pub use option::EquipmentOption;
pub use pricing::PriceCalculator;
