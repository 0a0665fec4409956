//! Persistence gateway for the inventory and orders service.
//!
//! Defines the connection-scoped transaction contract used by order
//! placement ([`StoreGateway`] / [`OrderTx`]) and the plain CRUD contract
//! used by the pass-through endpoints ([`RecordStore`]), with a
//! PostgreSQL implementation and an in-memory twin for tests.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod postgres;
pub mod records;

pub use error::{Result, StoreError};
pub use gateway::{DecrementOutcome, OrderTx, RecordStore, StoreGateway};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{Customer, OrderReportRow, Product, ProductPatch};
