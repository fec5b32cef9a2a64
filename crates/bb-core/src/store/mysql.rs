//! MySQL Client Store
//!
//! Relational backend over sqlx. One table per record type, keyed by the same
//! app-generated 13-char surrogate keys as the document backend, with
//! `client_id` foreign-key columns on the dependent tables.
//!
//! Every aggregate write (insert, update, cascade delete) runs inside a single
//! transaction, so a mid-sequence failure rolls the whole aggregate operation
//! back and the four record types can never drift apart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};

use crate::client::entity::{
    BalanceLog, Client, Contact, ContactChannel, Deposit, Education, Marital, Month, Outcome,
};
use crate::shared::error::{CoreError, Result};
use crate::store::{AggregateUpdate, ClientStore};

const CLIENT_COLUMNS: &str =
    "id, age, job, marital, education, `default`, balance, housing, loan, created_at, updated_at";
const CONTACT_COLUMNS: &str =
    "id, client_id, contact_type, day, month, duration, campaign, pdays, previous, poutcome";

/// MySQL implementation of `ClientStore`.
pub struct MySqlClientStore {
    pool: MySqlPool,
}

impl MySqlClientStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn parse_client(row: &sqlx::mysql::MySqlRow) -> Result<Client> {
        let marital: String = row.get("marital");
        let education: String = row.get("education");

        Ok(Client {
            id: row.get("id"),
            age: row.get("age"),
            job: row.get("job"),
            marital: Marital::parse(&marital)
                .ok_or_else(|| CoreError::internal(format!("bad marital value: {marital}")))?,
            education: Education::parse(&education)
                .ok_or_else(|| CoreError::internal(format!("bad education value: {education}")))?,
            default: row.get("default"),
            balance: row.get("balance"),
            housing: row.get("housing"),
            loan: row.get("loan"),
            created_at: millis_to_datetime(row.get("created_at"))?,
            updated_at: millis_to_datetime(row.get("updated_at"))?,
        })
    }

    fn parse_contact(row: &sqlx::mysql::MySqlRow) -> Result<Contact> {
        let contact_type: String = row.get("contact_type");
        let month: String = row.get("month");
        let poutcome: String = row.get("poutcome");

        Ok(Contact {
            id: row.get("id"),
            client_id: row.get("client_id"),
            contact_type: ContactChannel::parse(&contact_type).ok_or_else(|| {
                CoreError::internal(format!("bad contact_type value: {contact_type}"))
            })?,
            day: row.get("day"),
            month: Month::parse(&month)
                .ok_or_else(|| CoreError::internal(format!("bad month value: {month}")))?,
            duration: row.get("duration"),
            campaign: row.get("campaign"),
            pdays: row.get("pdays"),
            previous: row.get("previous"),
            poutcome: Outcome::parse(&poutcome)
                .ok_or_else(|| CoreError::internal(format!("bad poutcome value: {poutcome}")))?,
        })
    }

    fn parse_balance_log(row: &sqlx::mysql::MySqlRow) -> Result<BalanceLog> {
        Ok(BalanceLog {
            id: row.get("id"),
            client_id: row.get("client_id"),
            old_balance: row.get("old_balance"),
            new_balance: row.get("new_balance"),
            change_time: millis_to_datetime(row.get("change_time"))?,
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CoreError::internal(format!("bad epoch-millis timestamp: {millis}")))
}

async fn insert_client(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    client: &Client,
) -> Result<()> {
    let query = format!(
        "INSERT INTO clients ({CLIENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&query)
        .bind(&client.id)
        .bind(client.age)
        .bind(&client.job)
        .bind(client.marital.as_str())
        .bind(client.education.as_str())
        .bind(client.default)
        .bind(client.balance)
        .bind(client.housing)
        .bind(client.loan)
        .bind(client.created_at.timestamp_millis())
        .bind(client.updated_at.timestamp_millis())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_contact(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    contact: &Contact,
) -> Result<()> {
    let query = format!(
        "INSERT INTO contacts ({CONTACT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&query)
        .bind(&contact.id)
        .bind(&contact.client_id)
        .bind(contact.contact_type.as_str())
        .bind(contact.day)
        .bind(contact.month.as_str())
        .bind(contact.duration)
        .bind(contact.campaign)
        .bind(contact.pdays)
        .bind(contact.previous)
        .bind(contact.poutcome.as_str())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_balance_log(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    log: &BalanceLog,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO balance_logs (id, client_id, old_balance, new_balance, change_time) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&log.id)
    .bind(&log.client_id)
    .bind(log.old_balance)
    .bind(log.new_balance)
    .bind(log.change_time.timestamp_millis())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl ClientStore for MySqlClientStore {
    async fn insert_aggregate(
        &self,
        client: &Client,
        contact: &Contact,
        deposit: &Deposit,
        initial_log: &BalanceLog,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        insert_client(&mut tx, client).await?;
        insert_contact(&mut tx, contact).await?;
        sqlx::query("INSERT INTO deposits (id, client_id, deposit) VALUES (?, ?, ?)")
            .bind(&deposit.id)
            .bind(&deposit.client_id)
            .bind(deposit.deposit)
            .execute(&mut *tx)
            .await?;
        insert_balance_log(&mut tx, initial_log).await?;

        tx.commit().await?;

        debug!(client_id = %client.id, "Inserted client aggregate rows");
        Ok(())
    }

    async fn find_client(&self, id: &str) -> Result<Option<Client>> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?");
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::parse_client).transpose()
    }

    async fn find_contact(&self, client_id: &str) -> Result<Option<Contact>> {
        let query = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE client_id = ?");
        let row = sqlx::query(&query)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_contact).transpose()
    }

    async fn find_deposit(&self, client_id: &str) -> Result<Option<Deposit>> {
        let row = sqlx::query("SELECT id, client_id, deposit FROM deposits WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| Deposit {
            id: row.get("id"),
            client_id: row.get("client_id"),
            deposit: row.get("deposit"),
        }))
    }

    async fn find_balance_logs(&self, client_id: &str) -> Result<Vec<BalanceLog>> {
        let rows = sqlx::query(
            "SELECT id, client_id, old_balance, new_balance, change_time \
             FROM balance_logs WHERE client_id = ? ORDER BY change_time ASC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_balance_log).collect()
    }

    async fn list_clients(&self, skip: u64, limit: i64) -> Result<Vec<Client>> {
        let query = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id ASC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&query)
            .bind(limit.max(0))
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_client).collect()
    }

    async fn count_clients(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM clients")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }

    async fn apply_update(&self, update: &AggregateUpdate) -> Result<()> {
        let client = &update.client;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE clients SET age = ?, job = ?, marital = ?, education = ?, `default` = ?, \
             balance = ?, housing = ?, loan = ?, updated_at = ? WHERE id = ?",
        )
        .bind(client.age)
        .bind(&client.job)
        .bind(client.marital.as_str())
        .bind(client.education.as_str())
        .bind(client.default)
        .bind(client.balance)
        .bind(client.housing)
        .bind(client.loan)
        .bind(client.updated_at.timestamp_millis())
        .bind(&client.id)
        .execute(&mut *tx)
        .await?;

        if let Some(ref contact) = update.contact {
            sqlx::query(
                "UPDATE contacts SET contact_type = ?, day = ?, month = ?, duration = ?, \
                 campaign = ?, pdays = ?, previous = ?, poutcome = ? WHERE client_id = ?",
            )
            .bind(contact.contact_type.as_str())
            .bind(contact.day)
            .bind(contact.month.as_str())
            .bind(contact.duration)
            .bind(contact.campaign)
            .bind(contact.pdays)
            .bind(contact.previous)
            .bind(contact.poutcome.as_str())
            .bind(&contact.client_id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(ref deposit) = update.deposit {
            sqlx::query("UPDATE deposits SET deposit = ? WHERE client_id = ?")
                .bind(deposit.deposit)
                .bind(&deposit.client_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(ref log) = update.balance_log {
            insert_balance_log(&mut tx, log).await?;
        }

        tx.commit().await?;

        debug!(client_id = %client.id, "Applied aggregate update transactionally");
        Ok(())
    }

    async fn delete_aggregate(&self, client_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM contacts WHERE client_id = ?")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM deposits WHERE client_id = ?")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM balance_logs WHERE client_id = ?")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clients (
                id CHAR(13) PRIMARY KEY,
                age INT NOT NULL,
                job VARCHAR(100) NOT NULL,
                marital VARCHAR(20) NOT NULL,
                education VARCHAR(20) NOT NULL,
                `default` BOOLEAN NOT NULL,
                balance DOUBLE NOT NULL,
                housing BOOLEAN NOT NULL,
                loan BOOLEAN NOT NULL,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id CHAR(13) PRIMARY KEY,
                client_id CHAR(13) NOT NULL,
                contact_type VARCHAR(20) NOT NULL,
                day INT NOT NULL,
                month VARCHAR(3) NOT NULL,
                duration INT NOT NULL,
                campaign INT NOT NULL,
                pdays INT NOT NULL,
                previous INT NOT NULL,
                poutcome VARCHAR(20) NOT NULL,
                KEY idx_contacts_client_id (client_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deposits (
                id CHAR(13) PRIMARY KEY,
                client_id CHAR(13) NOT NULL,
                deposit BOOLEAN NOT NULL,
                KEY idx_deposits_client_id (client_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS balance_logs (
                id CHAR(13) PRIMARY KEY,
                client_id CHAR(13) NOT NULL,
                old_balance DOUBLE NOT NULL,
                new_balance DOUBLE NOT NULL,
                change_time BIGINT NOT NULL,
                KEY idx_balance_logs_client_time (client_id, change_time)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("MySQL schema ensured");
        Ok(())
    }
}
