//! `carkeeper-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, money, and the domain error model.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{
    AppointmentId, BranchId, BrandId, ColorId, ConfigurationId, DriveTypeId, EngineTypeId,
    GenerationId, ModelId, NewsId, OptionId, OrderId, ServiceTypeId, TransmissionId, TrimId,
    UserCarId, UserId,
};
pub use money::Money;
