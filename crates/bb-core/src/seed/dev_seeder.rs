//! Development Data Seeder
//!
//! Seeds a handful of sample client aggregates on startup so a fresh dev
//! instance has data to browse. Skipped when the store already holds clients.

use std::sync::Arc;

use tracing::info;

use crate::client::service::{ClientAggregateService, NewClientAggregate};
use crate::shared::error::Result;

/// Development data seeder
pub struct DevDataSeeder {
    service: Arc<ClientAggregateService>,
}

impl DevDataSeeder {
    pub fn new(service: Arc<ClientAggregateService>) -> Self {
        Self { service }
    }

    /// Seed sample clients unless the store already has data.
    pub async fn seed(&self) -> Result<()> {
        if self.service.count().await? > 0 {
            info!("Store already has clients, skipping dev seed");
            return Ok(());
        }

        info!("=== DEV DATA SEEDER ===");
        info!("Seeding sample clients...");

        for input in sample_clients() {
            let aggregate = self.service.create(input).await?;
            info!(client_id = %aggregate.client.id, job = %aggregate.client.job, "Seeded client");
        }

        info!("Development data seeded successfully!");
        info!("=======================");
        Ok(())
    }
}

fn sample_clients() -> Vec<NewClientAggregate> {
    vec![
        NewClientAggregate {
            age: 41,
            job: "technician".to_string(),
            marital: "married".to_string(),
            education: "secondary".to_string(),
            default: false,
            balance: 1350.0,
            housing: true,
            loan: false,
            contact: "cellular".to_string(),
            day: 16,
            month: "may".to_string(),
            duration: 185,
            campaign: 1,
            pdays: -1,
            previous: 0,
            poutcome: "unknown".to_string(),
            deposit: false,
        },
        NewClientAggregate {
            age: 33,
            job: "management".to_string(),
            marital: "single".to_string(),
            education: "tertiary".to_string(),
            default: false,
            balance: 4250.5,
            housing: false,
            loan: false,
            contact: "telephone".to_string(),
            day: 5,
            month: "jun".to_string(),
            duration: 310,
            campaign: 2,
            pdays: 92,
            previous: 1,
            poutcome: "success".to_string(),
            deposit: true,
        },
        NewClientAggregate {
            age: 57,
            job: "retired".to_string(),
            marital: "divorced".to_string(),
            education: "primary".to_string(),
            default: true,
            balance: -120.0,
            housing: false,
            loan: true,
            contact: "unknown".to_string(),
            day: 28,
            month: "nov".to_string(),
            duration: 45,
            campaign: 4,
            pdays: -1,
            previous: 0,
            poutcome: "failure".to_string(),
            deposit: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryClientStore;

    #[tokio::test]
    async fn seeds_once_and_only_once() {
        let store = Arc::new(MemoryClientStore::new());
        let service = Arc::new(ClientAggregateService::new(store));
        let seeder = DevDataSeeder::new(service.clone());

        seeder.seed().await.unwrap();
        let after_first = service.count().await.unwrap();
        assert_eq!(after_first, 3);

        seeder.seed().await.unwrap();
        assert_eq!(service.count().await.unwrap(), after_first);
    }
}
