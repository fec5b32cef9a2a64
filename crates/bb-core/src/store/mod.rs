//! Client Store Trait
//!
//! The pluggable persistence interface behind the aggregate service. The
//! service computes a full write-set and hands it over in one call so a
//! transactional backend can apply it atomically; backends without multi-record
//! transactions apply the writes in an order that never commits a balance
//! change without its log entry.

use async_trait::async_trait;

use crate::client::entity::{BalanceLog, Client, Contact, Deposit};
use crate::shared::error::Result;

pub mod memory;
pub mod mongo;
pub mod mysql;

/// The complete write-set of one aggregate update.
///
/// `client` always carries the post-update state. Dependent records are only
/// present when the patch touched them; `balance_log` is present iff the
/// balance actually changed.
#[derive(Debug, Clone)]
pub struct AggregateUpdate {
    pub client: Client,
    pub contact: Option<Contact>,
    pub deposit: Option<Deposit>,
    pub balance_log: Option<BalanceLog>,
}

/// Persistence interface for the client aggregate.
///
/// Implemented for MongoDB, MySQL, and an in-memory store; selected once at
/// startup and passed to the service explicitly.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Insert a freshly created aggregate: client, contact, deposit, and the
    /// initial balance-log entry.
    async fn insert_aggregate(
        &self,
        client: &Client,
        contact: &Contact,
        deposit: &Deposit,
        initial_log: &BalanceLog,
    ) -> Result<()>;

    async fn find_client(&self, id: &str) -> Result<Option<Client>>;

    async fn find_contact(&self, client_id: &str) -> Result<Option<Contact>>;

    async fn find_deposit(&self, client_id: &str) -> Result<Option<Deposit>>;

    /// All balance-log entries for a client, ordered by change time ascending.
    async fn find_balance_logs(&self, client_id: &str) -> Result<Vec<BalanceLog>>;

    /// Clients only (no dependents), ordered by id, offset by `skip`, at most
    /// `limit` records.
    async fn list_clients(&self, skip: u64, limit: i64) -> Result<Vec<Client>>;

    async fn count_clients(&self) -> Result<u64>;

    /// Apply one aggregate update write-set.
    async fn apply_update(&self, update: &AggregateUpdate) -> Result<()>;

    /// Cascade-delete the contact, deposit, and all balance logs for the
    /// client, then the client itself. Returns false when no client existed.
    async fn delete_aggregate(&self, client_id: &str) -> Result<bool>;

    /// Create tables or indexes as needed. Called once at startup.
    async fn init_schema(&self) -> Result<()>;
}
