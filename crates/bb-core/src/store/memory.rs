//! In-Memory Client Store
//!
//! Backs tests and dev mode. Clients are kept in a `BTreeMap` keyed by their
//! surrogate key, which is time-sorted, so iteration order doubles as the
//! list order. Every aggregate operation runs under one write lock, so this
//! backend is trivially atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::entity::{BalanceLog, Client, Contact, Deposit};
use crate::shared::error::Result;
use crate::store::{AggregateUpdate, ClientStore};

#[derive(Default)]
struct Inner {
    clients: BTreeMap<String, Client>,
    contacts: HashMap<String, Contact>,
    deposits: HashMap<String, Deposit>,
    balance_logs: HashMap<String, Vec<BalanceLog>>,
}

/// In-memory implementation of `ClientStore`.
#[derive(Default)]
pub struct MemoryClientStore {
    inner: RwLock<Inner>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn insert_aggregate(
        &self,
        client: &Client,
        contact: &Contact,
        deposit: &Deposit,
        initial_log: &BalanceLog,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        inner.clients.insert(client.id.clone(), client.clone());
        inner.contacts.insert(client.id.clone(), contact.clone());
        inner.deposits.insert(client.id.clone(), deposit.clone());
        inner
            .balance_logs
            .insert(client.id.clone(), vec![initial_log.clone()]);
        Ok(())
    }

    async fn find_client(&self, id: &str) -> Result<Option<Client>> {
        Ok(self.inner.read().clients.get(id).cloned())
    }

    async fn find_contact(&self, client_id: &str) -> Result<Option<Contact>> {
        Ok(self.inner.read().contacts.get(client_id).cloned())
    }

    async fn find_deposit(&self, client_id: &str) -> Result<Option<Deposit>> {
        Ok(self.inner.read().deposits.get(client_id).cloned())
    }

    async fn find_balance_logs(&self, client_id: &str) -> Result<Vec<BalanceLog>> {
        Ok(self
            .inner
            .read()
            .balance_logs
            .get(client_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_clients(&self, skip: u64, limit: i64) -> Result<Vec<Client>> {
        let inner = self.inner.read();
        Ok(inner
            .clients
            .values()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_clients(&self) -> Result<u64> {
        Ok(self.inner.read().clients.len() as u64)
    }

    async fn apply_update(&self, update: &AggregateUpdate) -> Result<()> {
        let mut inner = self.inner.write();
        let client_id = update.client.id.clone();

        inner.clients.insert(client_id.clone(), update.client.clone());
        if let Some(ref contact) = update.contact {
            inner.contacts.insert(client_id.clone(), contact.clone());
        }
        if let Some(ref deposit) = update.deposit {
            inner.deposits.insert(client_id.clone(), deposit.clone());
        }
        if let Some(ref log) = update.balance_log {
            inner
                .balance_logs
                .entry(client_id)
                .or_default()
                .push(log.clone());
        }
        Ok(())
    }

    async fn delete_aggregate(&self, client_id: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        inner.contacts.remove(client_id);
        inner.deposits.remove(client_id);
        inner.balance_logs.remove(client_id);
        Ok(inner.clients.remove(client_id).is_some())
    }

    async fn init_schema(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_common::SurrogateKey;
    use chrono::Utc;

    use crate::client::entity::{ContactChannel, Education, Marital, Month, Outcome};

    fn sample_aggregate(balance: f64) -> (Client, Contact, Deposit, BalanceLog) {
        let now = Utc::now();
        let client = Client {
            id: SurrogateKey::generate(),
            age: 35,
            job: "services".to_string(),
            marital: Marital::Single,
            education: Education::Tertiary,
            default: false,
            balance,
            housing: false,
            loan: false,
            created_at: now,
            updated_at: now,
        };
        let contact = Contact {
            id: SurrogateKey::generate(),
            client_id: client.id.clone(),
            contact_type: ContactChannel::Telephone,
            day: 5,
            month: Month::Jun,
            duration: 60,
            campaign: 2,
            pdays: -1,
            previous: 0,
            poutcome: Outcome::Unknown,
        };
        let deposit = Deposit {
            id: SurrogateKey::generate(),
            client_id: client.id.clone(),
            deposit: true,
        };
        let log = BalanceLog::record(client.id.clone(), 0.0, balance);
        (client, contact, deposit, log)
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = MemoryClientStore::new();
        let (client, contact, deposit, log) = sample_aggregate(500.0);
        store
            .insert_aggregate(&client, &contact, &deposit, &log)
            .await
            .unwrap();

        assert!(store.find_client(&client.id).await.unwrap().is_some());
        assert!(store.find_contact(&client.id).await.unwrap().is_some());
        assert!(store.find_deposit(&client.id).await.unwrap().is_some());
        assert_eq!(store.find_balance_logs(&client.id).await.unwrap().len(), 1);
        assert_eq!(store.count_clients().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_paged() {
        let store = MemoryClientStore::new();
        for i in 0..5 {
            let (client, contact, deposit, log) = sample_aggregate(i as f64);
            store
                .insert_aggregate(&client, &contact, &deposit, &log)
                .await
                .unwrap();
        }

        let all = store.list_clients(0, 10).await.unwrap();
        assert_eq!(all.len(), 5);
        let ids: Vec<_> = all.iter().map(|c| c.id.clone()).collect();
        let sorted = {
            let mut s = ids.clone();
            s.sort();
            s
        };
        assert_eq!(ids, sorted);

        let page = store.list_clients(3, 10).await.unwrap();
        assert_eq!(page.len(), 2);

        let empty = store.list_clients(100, 10).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = MemoryClientStore::new();
        let (client, contact, deposit, log) = sample_aggregate(42.0);
        store
            .insert_aggregate(&client, &contact, &deposit, &log)
            .await
            .unwrap();

        assert!(store.delete_aggregate(&client.id).await.unwrap());
        assert!(store.find_client(&client.id).await.unwrap().is_none());
        assert!(store.find_contact(&client.id).await.unwrap().is_none());
        assert!(store.find_deposit(&client.id).await.unwrap().is_none());
        assert!(store.find_balance_logs(&client.id).await.unwrap().is_empty());

        // Second delete reports nothing removed.
        assert!(!store.delete_aggregate(&client.id).await.unwrap());
    }
}
