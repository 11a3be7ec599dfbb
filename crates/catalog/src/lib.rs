//! Vehicle catalog: the brand -> model -> generation -> trim hierarchy and
//! the technical dictionaries trims refer to.
//!
//! Pure data and filtering rules. Reading the catalog is the storage layer's job.

pub mod dictionary;
pub mod lineup;
pub mod trim;

pub use dictionary::{DriveType, EngineType, Transmission};
pub use lineup::{Brand, CarModel, Generation};
pub use trim::{Trim, TrimDetails, TrimFilter, parse_id_list};
