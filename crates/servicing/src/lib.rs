//! After-sales servicing: branches, service types, the cars customers own,
//! and service appointments.

pub mod appointment;
pub mod branch;
pub mod service_type;
pub mod user_car;

pub use appointment::{
    AppointmentDetails, AppointmentStatus, BookAppointment, BookingError, ServiceAppointment,
    check_booking,
};
pub use branch::Branch;
pub use service_type::ServiceType;
pub use user_car::{RegisterCar, UserCar, UserCarDetails, VIN_LEN};
