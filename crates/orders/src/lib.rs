//! Vehicle orders placed from saved configurations.

pub mod order;

pub use order::{Order, OrderDetails, OrderError, OrderStatus};
