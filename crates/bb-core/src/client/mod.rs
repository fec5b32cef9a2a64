//! Client aggregate: entities, service, and REST endpoints.

pub mod api;
pub mod entity;
pub mod service;

pub use entity::{BalanceLog, Client, Contact, Deposit};
pub use service::ClientAggregateService;
