//! MongoDB Client Store
//!
//! Document-store backend. Each record type lives in its own collection
//! (`clients`, `contacts`, `deposits`, `balance_logs`) with the dependent
//! collections keyed by a plain `clientId` field.
//!
//! MongoDB offers no multi-document transaction on a standalone server, so an
//! aggregate write is a short ordered sequence of point writes. The balance
//! log is inserted before the client document is replaced: a mid-sequence
//! failure can leave a stray log entry but never an unlogged balance change.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::{debug, info};

use crate::client::entity::{BalanceLog, Client, Contact, Deposit};
use crate::shared::error::Result;
use crate::store::{AggregateUpdate, ClientStore};

/// MongoDB implementation of `ClientStore`.
pub struct MongoClientStore {
    clients: Collection<Client>,
    contacts: Collection<Contact>,
    deposits: Collection<Deposit>,
    balance_logs: Collection<BalanceLog>,
}

impl MongoClientStore {
    pub fn new(db: &Database) -> Self {
        Self {
            clients: db.collection("clients"),
            contacts: db.collection("contacts"),
            deposits: db.collection("deposits"),
            balance_logs: db.collection("balance_logs"),
        }
    }
}

#[async_trait]
impl ClientStore for MongoClientStore {
    async fn insert_aggregate(
        &self,
        client: &Client,
        contact: &Contact,
        deposit: &Deposit,
        initial_log: &BalanceLog,
    ) -> Result<()> {
        self.clients.insert_one(client).await?;
        self.contacts.insert_one(contact).await?;
        self.deposits.insert_one(deposit).await?;
        self.balance_logs.insert_one(initial_log).await?;

        debug!(client_id = %client.id, "Inserted client aggregate documents");
        Ok(())
    }

    async fn find_client(&self, id: &str) -> Result<Option<Client>> {
        Ok(self.clients.find_one(doc! { "_id": id }).await?)
    }

    async fn find_contact(&self, client_id: &str) -> Result<Option<Contact>> {
        Ok(self.contacts.find_one(doc! { "clientId": client_id }).await?)
    }

    async fn find_deposit(&self, client_id: &str) -> Result<Option<Deposit>> {
        Ok(self.deposits.find_one(doc! { "clientId": client_id }).await?)
    }

    async fn find_balance_logs(&self, client_id: &str) -> Result<Vec<BalanceLog>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "changeTime": 1 })
            .build();
        let cursor = self
            .balance_logs
            .find(doc! { "clientId": client_id })
            .with_options(find_options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_clients(&self, skip: u64, limit: i64) -> Result<Vec<Client>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self.clients.find(doc! {}).with_options(find_options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_clients(&self) -> Result<u64> {
        Ok(self.clients.count_documents(doc! {}).await?)
    }

    async fn apply_update(&self, update: &AggregateUpdate) -> Result<()> {
        let client_id = &update.client.id;

        // Log first: a balance change must never be committed without it.
        if let Some(ref log) = update.balance_log {
            self.balance_logs.insert_one(log).await?;
        }

        self.clients
            .replace_one(doc! { "_id": client_id }, &update.client)
            .await?;

        if let Some(ref contact) = update.contact {
            self.contacts
                .replace_one(doc! { "clientId": client_id }, contact)
                .await?;
        }
        if let Some(ref deposit) = update.deposit {
            self.deposits
                .replace_one(doc! { "clientId": client_id }, deposit)
                .await?;
        }

        debug!(client_id = %client_id, "Applied aggregate update");
        Ok(())
    }

    async fn delete_aggregate(&self, client_id: &str) -> Result<bool> {
        self.contacts
            .delete_one(doc! { "clientId": client_id })
            .await?;
        self.deposits
            .delete_one(doc! { "clientId": client_id })
            .await?;
        self.balance_logs
            .delete_many(doc! { "clientId": client_id })
            .await?;

        let result = self.clients.delete_one(doc! { "_id": client_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn init_schema(&self) -> Result<()> {
        // Dependent collections are always filtered by clientId.
        let client_id_index = IndexModel::builder().keys(doc! { "clientId": 1 }).build();

        self.contacts.create_index(client_id_index.clone()).await?;
        self.deposits.create_index(client_id_index.clone()).await?;
        self.balance_logs
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "clientId": 1, "changeTime": 1 })
                    .build(),
            )
            .await?;

        info!("MongoDB indexes ensured");
        Ok(())
    }
}
