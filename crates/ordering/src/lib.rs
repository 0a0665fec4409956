//! Atomic order placement.
//!
//! The one part of the service with a real correctness contract: given a
//! customer and a set of products with quantities, create the order
//! header, one line item per product, and decrement each product's stock,
//! such that either everything is persisted or nothing is. The
//! [`OrderCoordinator`] drives the sequence, the [`InventoryLedger`] owns
//! the contention-safe decrement, and the rollback path guarantees the
//! transaction is aborted and its connection released on every failure.

pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod receipt;
pub mod request;
mod rollback;

pub use coordinator::OrderCoordinator;
pub use error::OrderError;
pub use ledger::InventoryLedger;
pub use receipt::{OrderReceipt, PlacedLine, PlacedOrder};
pub use request::{NewOrder, OrderLine};
