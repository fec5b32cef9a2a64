//! Bankbook Core
//!
//! Domain crate for the banking-client aggregate:
//! - Client records plus their dependent Contact, Deposit, and append-only
//!   BalanceLog entries, managed as one consistency unit
//! - A pluggable store interface with MongoDB, MySQL, and in-memory backends
//! - REST endpoints for the aggregate operations
//!
//! ## Module Organization
//!
//! - `client` - entities, the aggregate service, and REST endpoints
//! - `store` - the `ClientStore` trait and its backends
//! - `shared` - error taxonomy and common API types
//! - `seed` - development sample data

pub mod client;
pub mod seed;
pub mod shared;
pub mod store;

// Re-export common types
pub use shared::error::{CoreError, Result};

// Re-export main entity types for convenience
pub use client::entity::{
    BalanceLog, Client, Contact, ContactChannel, Deposit, Education, Marital, Month, Outcome,
};
pub use client::service::{ClientAggregate, ClientAggregateService, ClientPatch, NewClientAggregate};

// Re-export store backends
pub use store::memory::MemoryClientStore;
pub use store::mongo::MongoClientStore;
pub use store::mysql::MySqlClientStore;
pub use store::{AggregateUpdate, ClientStore};
