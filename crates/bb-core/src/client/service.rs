//! Client Aggregate Service
//!
//! The aggregate manager: create/get/list/update/delete over a Client and its
//! dependent Contact, Deposit, and BalanceLog records, keeping the four record
//! types consistent. All persistence goes through an explicitly injected
//! `ClientStore`; the service holds no global state.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use bb_common::SurrogateKey;

use crate::client::entity::{
    BalanceLog, Client, Contact, ContactChannel, Deposit, Education, Marital, Month, Outcome,
};
use crate::shared::error::{CoreError, Result};
use crate::store::{AggregateUpdate, ClientStore};

/// A client together with its dependent records.
///
/// Contact and Deposit are optional on read: data imported out-of-band may
/// lack them, and `get` reports that as null fields rather than failing.
#[derive(Debug, Clone)]
pub struct ClientAggregate {
    pub client: Client,
    pub contact: Option<Contact>,
    pub deposit: Option<Deposit>,
    pub balance_logs: Vec<BalanceLog>,
}

/// Input for creating a client aggregate. All fields required.
///
/// Enumerated fields arrive as strings and are validated against the allowed
/// value sets; out-of-set values are a `Validation` error naming the field.
#[derive(Debug, Clone)]
pub struct NewClientAggregate {
    pub age: i32,
    pub job: String,
    pub marital: String,
    pub education: String,
    pub default: bool,
    pub balance: f64,
    pub housing: bool,
    pub loan: bool,

    // Contact fields
    pub contact: String,
    pub day: i32,
    pub month: String,
    pub duration: i32,
    pub campaign: i32,
    pub pdays: i32,
    pub previous: i32,
    pub poutcome: String,

    // Deposit field
    pub deposit: bool,
}

/// Partial update of a client aggregate. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub age: Option<i32>,
    pub job: Option<String>,
    pub marital: Option<String>,
    pub education: Option<String>,
    pub default: Option<bool>,
    pub balance: Option<f64>,
    pub housing: Option<bool>,
    pub loan: Option<bool>,

    pub contact: Option<String>,
    pub day: Option<i32>,
    pub month: Option<String>,
    pub duration: Option<i32>,
    pub campaign: Option<i32>,
    pub pdays: Option<i32>,
    pub previous: Option<i32>,
    pub poutcome: Option<String>,

    pub deposit: Option<bool>,
}

impl ClientPatch {
    fn touches_contact(&self) -> bool {
        self.contact.is_some()
            || self.day.is_some()
            || self.month.is_some()
            || self.duration.is_some()
            || self.campaign.is_some()
            || self.pdays.is_some()
            || self.previous.is_some()
            || self.poutcome.is_some()
    }

    fn touches_client(&self) -> bool {
        self.age.is_some()
            || self.job.is_some()
            || self.marital.is_some()
            || self.education.is_some()
            || self.default.is_some()
            || self.balance.is_some()
            || self.housing.is_some()
            || self.loan.is_some()
    }
}

/// The aggregate manager.
pub struct ClientAggregateService {
    store: Arc<dyn ClientStore>,
}

impl ClientAggregateService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Create a client with its contact, deposit flag, and initial balance log.
    pub async fn create(&self, input: NewClientAggregate) -> Result<ClientAggregate> {
        let marital = parse_marital(&input.marital)?;
        let education = parse_education(&input.education)?;
        let contact_type = parse_channel(&input.contact)?;
        let month = parse_month(&input.month)?;
        let poutcome = parse_outcome(&input.poutcome)?;

        validate_age(input.age)?;
        validate_job(&input.job)?;
        validate_balance(input.balance)?;
        validate_day(input.day)?;
        validate_duration(input.duration)?;
        validate_campaign(input.campaign)?;
        validate_pdays(input.pdays)?;
        validate_previous(input.previous)?;

        let now = Utc::now();
        let client = Client {
            id: SurrogateKey::generate(),
            age: input.age,
            job: input.job.trim().to_string(),
            marital,
            education,
            default: input.default,
            balance: input.balance,
            housing: input.housing,
            loan: input.loan,
            created_at: now,
            updated_at: now,
        };
        let contact = Contact {
            id: SurrogateKey::generate(),
            client_id: client.id.clone(),
            contact_type,
            day: input.day,
            month,
            duration: input.duration,
            campaign: input.campaign,
            pdays: input.pdays,
            previous: input.previous,
            poutcome,
        };
        let deposit = Deposit {
            id: SurrogateKey::generate(),
            client_id: client.id.clone(),
            deposit: input.deposit,
        };
        // Starting balance is logged as a change from zero.
        let initial_log = BalanceLog::record(client.id.clone(), 0.0, input.balance);

        self.store
            .insert_aggregate(&client, &contact, &deposit, &initial_log)
            .await?;

        info!(client_id = %client.id, "Created client aggregate");

        Ok(ClientAggregate {
            client,
            contact: Some(contact),
            deposit: Some(deposit),
            balance_logs: vec![initial_log],
        })
    }

    /// Fetch the full aggregate for a client.
    pub async fn get(&self, id: &str) -> Result<ClientAggregate> {
        let client = self
            .store
            .find_client(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", id))?;

        let contact = self.store.find_contact(id).await?;
        let deposit = self.store.find_deposit(id).await?;
        let balance_logs = self.store.find_balance_logs(id).await?;

        Ok(ClientAggregate {
            client,
            contact,
            deposit,
            balance_logs,
        })
    }

    /// List client records only, ordered by id.
    ///
    /// An empty page is an empty vector, never an error.
    pub async fn list(&self, skip: u64, limit: i64) -> Result<Vec<Client>> {
        self.store.list_clients(skip, limit).await
    }

    /// Total number of stored clients.
    pub async fn count(&self) -> Result<u64> {
        self.store.count_clients().await
    }

    /// Apply a partial update to the aggregate.
    ///
    /// Iff the patch carries a `balance` different from the stored value, the
    /// new value is persisted and exactly one BalanceLog entry is appended.
    /// Returns the refreshed aggregate.
    pub async fn update(&self, id: &str, patch: ClientPatch) -> Result<ClientAggregate> {
        let mut client = self
            .store
            .find_client(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", id))?;

        let old_balance = client.balance;

        // Validate and apply client fields.
        if let Some(age) = patch.age {
            validate_age(age)?;
            client.age = age;
        }
        if let Some(ref job) = patch.job {
            validate_job(job)?;
            client.job = job.trim().to_string();
        }
        if let Some(ref marital) = patch.marital {
            client.marital = parse_marital(marital)?;
        }
        if let Some(ref education) = patch.education {
            client.education = parse_education(education)?;
        }
        if let Some(default) = patch.default {
            client.default = default;
        }
        if let Some(balance) = patch.balance {
            validate_balance(balance)?;
            client.balance = balance;
        }
        if let Some(housing) = patch.housing {
            client.housing = housing;
        }
        if let Some(loan) = patch.loan {
            client.loan = loan;
        }

        // A balance write that does not change the value is not logged.
        let balance_log = match patch.balance {
            Some(new_balance) if new_balance != old_balance => {
                Some(BalanceLog::record(client.id.clone(), old_balance, new_balance))
            }
            _ => None,
        };

        // Dependent records are patched only when touched, and silently skipped
        // when missing (out-of-band imports may not have created them).
        let contact = if patch.touches_contact() {
            match self.store.find_contact(id).await? {
                Some(mut contact) => {
                    if let Some(ref channel) = patch.contact {
                        contact.contact_type = parse_channel(channel)?;
                    }
                    if let Some(day) = patch.day {
                        validate_day(day)?;
                        contact.day = day;
                    }
                    if let Some(ref month) = patch.month {
                        contact.month = parse_month(month)?;
                    }
                    if let Some(duration) = patch.duration {
                        validate_duration(duration)?;
                        contact.duration = duration;
                    }
                    if let Some(campaign) = patch.campaign {
                        validate_campaign(campaign)?;
                        contact.campaign = campaign;
                    }
                    if let Some(pdays) = patch.pdays {
                        validate_pdays(pdays)?;
                        contact.pdays = pdays;
                    }
                    if let Some(previous) = patch.previous {
                        validate_previous(previous)?;
                        contact.previous = previous;
                    }
                    if let Some(ref poutcome) = patch.poutcome {
                        contact.poutcome = parse_outcome(poutcome)?;
                    }
                    Some(contact)
                }
                None => None,
            }
        } else {
            None
        };

        let deposit = if let Some(flag) = patch.deposit {
            match self.store.find_deposit(id).await? {
                Some(mut deposit) => {
                    deposit.deposit = flag;
                    Some(deposit)
                }
                None => None,
            }
        } else {
            None
        };

        if patch.touches_client() || contact.is_some() || deposit.is_some() {
            client.updated_at = Utc::now();
        }

        let balance_changed = balance_log.is_some();
        self.store
            .apply_update(&AggregateUpdate {
                client,
                contact,
                deposit,
                balance_log,
            })
            .await?;

        debug!(client_id = %id, balance_changed, "Updated client aggregate");

        self.get(id).await
    }

    /// Delete the client and every dependent record.
    ///
    /// Returns the aggregate as it existed immediately before deletion.
    pub async fn delete(&self, id: &str) -> Result<ClientAggregate> {
        let snapshot = self.get(id).await?;

        self.store.delete_aggregate(id).await?;

        info!(client_id = %id, "Deleted client aggregate");
        Ok(snapshot)
    }
}

// Field validation. Wrong-typed numerics are rejected at deserialization;
// these checks cover the semantic ranges and the enumerated value sets.

fn parse_marital(s: &str) -> Result<Marital> {
    Marital::parse(s)
        .ok_or_else(|| CoreError::validation("marital", "must be one of married, single, divorced"))
}

fn parse_education(s: &str) -> Result<Education> {
    Education::parse(s).ok_or_else(|| {
        CoreError::validation("education", "must be one of primary, secondary, tertiary, unknown")
    })
}

fn parse_channel(s: &str) -> Result<ContactChannel> {
    ContactChannel::parse(s).ok_or_else(|| {
        CoreError::validation("contact", "must be one of cellular, telephone, unknown")
    })
}

fn parse_month(s: &str) -> Result<Month> {
    Month::parse(s)
        .ok_or_else(|| CoreError::validation("month", "must be a three-letter month, e.g. jan"))
}

fn parse_outcome(s: &str) -> Result<Outcome> {
    Outcome::parse(s).ok_or_else(|| {
        CoreError::validation("poutcome", "must be one of success, failure, other, unknown")
    })
}

fn validate_age(age: i32) -> Result<()> {
    if !(18..=120).contains(&age) {
        return Err(CoreError::validation("age", "must be between 18 and 120"));
    }
    Ok(())
}

fn validate_job(job: &str) -> Result<()> {
    let job = job.trim();
    if job.is_empty() {
        return Err(CoreError::validation("job", "must not be empty"));
    }
    if job.len() > 100 {
        return Err(CoreError::validation("job", "must be at most 100 characters"));
    }
    Ok(())
}

fn validate_balance(balance: f64) -> Result<()> {
    if !balance.is_finite() {
        return Err(CoreError::validation("balance", "must be a finite number"));
    }
    Ok(())
}

fn validate_day(day: i32) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(CoreError::validation("day", "must be between 1 and 31"));
    }
    Ok(())
}

fn validate_duration(duration: i32) -> Result<()> {
    if duration < 0 {
        return Err(CoreError::validation("duration", "must not be negative"));
    }
    Ok(())
}

fn validate_campaign(campaign: i32) -> Result<()> {
    if campaign < 1 {
        return Err(CoreError::validation("campaign", "must be at least 1"));
    }
    Ok(())
}

fn validate_pdays(pdays: i32) -> Result<()> {
    // -1 means the client was never contacted before.
    if pdays < -1 {
        return Err(CoreError::validation("pdays", "must be -1 or greater"));
    }
    Ok(())
}

fn validate_previous(previous: i32) -> Result<()> {
    if previous < 0 {
        return Err(CoreError::validation("previous", "must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryClientStore;

    fn sample_input() -> NewClientAggregate {
        NewClientAggregate {
            age: 41,
            job: "technician".to_string(),
            marital: "married".to_string(),
            education: "secondary".to_string(),
            default: false,
            balance: 1270.0,
            housing: true,
            loan: false,
            contact: "cellular".to_string(),
            day: 12,
            month: "may".to_string(),
            duration: 180,
            campaign: 1,
            pdays: -1,
            previous: 0,
            poutcome: "unknown".to_string(),
            deposit: false,
        }
    }

    fn service() -> ClientAggregateService {
        ClientAggregateService::new(Arc::new(MemoryClientStore::new()))
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_marital() {
        let mut input = sample_input();
        input.marital = "widowed".to_string();
        let err = service().create(input).await.unwrap_err();
        match err {
            CoreError::Validation { field, .. } => assert_eq!(field, "marital"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_age() {
        let mut input = sample_input();
        input.age = 9;
        assert!(matches!(
            service().create(input).await,
            Err(CoreError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_day_out_of_month_range() {
        let mut input = sample_input();
        input.day = 32;
        assert!(matches!(
            service().create(input).await,
            Err(CoreError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_month_without_touching_store() {
        let svc = service();
        let created = svc.create(sample_input()).await.unwrap();

        let patch = ClientPatch {
            month: Some("january".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&created.client.id, patch).await,
            Err(CoreError::Validation { .. })
        ));

        // The contact must be untouched.
        let refreshed = svc.get(&created.client.id).await.unwrap();
        assert_eq!(refreshed.contact.unwrap().month, Month::May);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        assert!(matches!(
            service().get("0MISSINGID000").await,
            Err(CoreError::NotFound { .. })
        ));
    }
}
