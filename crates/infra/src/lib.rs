//! Infrastructure layer: storage traits and their Postgres and in-memory
//! implementations.

pub mod demo;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{
    CatalogStore, ConfiguratorStore, NewsStore, OrderStore, ServicingStore, Store, UserStore,
};
