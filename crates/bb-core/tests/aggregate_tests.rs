//! Client Aggregate Integration Tests
//!
//! Exercises the aggregate service end to end against the in-memory store:
//! create/read/update/delete lifecycle, balance log append rules, and
//! not-found handling.

use std::sync::Arc;

use bb_core::{
    ClientAggregateService, ClientPatch, CoreError, MemoryClientStore, NewClientAggregate,
};

fn service() -> ClientAggregateService {
    ClientAggregateService::new(Arc::new(MemoryClientStore::new()))
}

fn sample_input(balance: f64) -> NewClientAggregate {
    NewClientAggregate {
        age: 35,
        job: "technician".to_string(),
        marital: "married".to_string(),
        education: "secondary".to_string(),
        default: false,
        balance,
        housing: true,
        loan: false,
        contact: "cellular".to_string(),
        day: 12,
        month: "may".to_string(),
        duration: 200,
        campaign: 1,
        pdays: -1,
        previous: 0,
        poutcome: "unknown".to_string(),
        deposit: false,
    }
}

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn create_returns_full_aggregate_with_initial_log() {
        let svc = service();
        let aggregate = svc.create(sample_input(1000.0)).await.unwrap();

        assert_eq!(aggregate.client.balance, 1000.0);
        assert_eq!(aggregate.client.job, "technician");

        let contact = aggregate.contact.expect("contact record");
        assert_eq!(contact.client_id, aggregate.client.id);
        assert_eq!(contact.day, 12);

        let deposit = aggregate.deposit.expect("deposit record");
        assert_eq!(deposit.client_id, aggregate.client.id);
        assert!(!deposit.deposit);

        assert_eq!(aggregate.balance_logs.len(), 1);
        assert_eq!(aggregate.balance_logs[0].old_balance, 0.0);
        assert_eq!(aggregate.balance_logs[0].new_balance, 1000.0);
    }

    #[tokio::test]
    async fn get_returns_what_create_stored() {
        let svc = service();
        let created = svc.create(sample_input(500.0)).await.unwrap();

        let fetched = svc.get(&created.client.id).await.unwrap();
        assert_eq!(fetched.client.id, created.client.id);
        assert_eq!(fetched.client.balance, 500.0);
        assert!(fetched.contact.is_some());
        assert!(fetched.deposit.is_some());
        assert_eq!(fetched.balance_logs.len(), 1);
    }

    #[tokio::test]
    async fn list_pages_in_id_order() {
        let svc = service();
        let mut ids = Vec::new();
        for i in 0..5 {
            let created = svc.create(sample_input(100.0 * i as f64)).await.unwrap();
            ids.push(created.client.id);
        }

        let first_page = svc.list(0, 3).await.unwrap();
        assert_eq!(first_page.len(), 3);
        let second_page = svc.list(3, 3).await.unwrap();
        assert_eq!(second_page.len(), 2);

        let listed: Vec<String> = first_page
            .into_iter()
            .chain(second_page)
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, ids);

        assert_eq!(svc.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn list_on_empty_store_is_empty() {
        let svc = service();
        assert!(svc.list(0, 10).await.unwrap().is_empty());
        assert_eq!(svc.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_returns_snapshot_and_cascades() {
        let svc = service();
        let created = svc.create(sample_input(750.0)).await.unwrap();
        let id = created.client.id.clone();

        let snapshot = svc.delete(&id).await.unwrap();
        assert_eq!(snapshot.client.id, id);
        assert!(snapshot.contact.is_some());
        assert_eq!(snapshot.balance_logs.len(), 1);

        match svc.get(&id).await {
            Err(CoreError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}

mod balance_log_tests {
    use super::*;

    #[tokio::test]
    async fn balance_change_appends_exactly_one_log() {
        let svc = service();
        let created = svc.create(sample_input(1000.0)).await.unwrap();
        let id = created.client.id.clone();

        let patch = ClientPatch {
            balance: Some(1500.0),
            ..Default::default()
        };
        let updated = svc.update(&id, patch).await.unwrap();

        assert_eq!(updated.client.balance, 1500.0);
        assert_eq!(updated.balance_logs.len(), 2);
        assert_eq!(updated.balance_logs[1].old_balance, 1000.0);
        assert_eq!(updated.balance_logs[1].new_balance, 1500.0);
    }

    #[tokio::test]
    async fn update_without_balance_leaves_logs_alone() {
        let svc = service();
        let created = svc.create(sample_input(1000.0)).await.unwrap();
        let id = created.client.id.clone();

        let patch = ClientPatch {
            job: Some("management".to_string()),
            ..Default::default()
        };
        let updated = svc.update(&id, patch).await.unwrap();

        assert_eq!(updated.client.job, "management");
        assert_eq!(updated.client.balance, 1000.0);
        assert_eq!(updated.balance_logs.len(), 1);
    }

    #[tokio::test]
    async fn unchanged_balance_value_does_not_log() {
        let svc = service();
        let created = svc.create(sample_input(1000.0)).await.unwrap();
        let id = created.client.id.clone();

        let patch = ClientPatch {
            balance: Some(1000.0),
            ..Default::default()
        };
        let updated = svc.update(&id, patch).await.unwrap();

        assert_eq!(updated.balance_logs.len(), 1);
    }

    #[tokio::test]
    async fn full_lifecycle_keeps_log_history_consistent() {
        let svc = service();
        let created = svc.create(sample_input(1000.0)).await.unwrap();
        let id = created.client.id.clone();

        let updated = svc
            .update(
                &id,
                ClientPatch {
                    balance: Some(1500.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.balance_logs.len(), 2);
        assert_eq!(updated.balance_logs[1].old_balance, 1000.0);
        assert_eq!(updated.balance_logs[1].new_balance, 1500.0);

        let touched = svc
            .update(
                &id,
                ClientPatch {
                    housing: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(touched.balance_logs.len(), 2);

        svc.delete(&id).await.unwrap();
        assert!(matches!(
            svc.get(&id).await,
            Err(CoreError::NotFound { .. })
        ));
    }
}

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_unknown_marital_status() {
        let svc = service();
        let mut input = sample_input(100.0);
        input.marital = "widowed".to_string();

        match svc.create(input).await {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field, "marital"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_age() {
        let svc = service();
        let mut input = sample_input(100.0);
        input.age = 17;

        assert!(matches!(
            svc.create(input).await,
            Err(CoreError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn update_rejects_invalid_month() {
        let svc = service();
        let created = svc.create(sample_input(100.0)).await.unwrap();

        let patch = ClientPatch {
            month: Some("smarch".to_string()),
            ..Default::default()
        };
        match svc.update(&created.client.id, patch).await {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field, "month"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }
}

mod not_found_tests {
    use super::*;

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.get("0000000000000").await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let svc = service();
        let patch = ClientPatch {
            balance: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(
            svc.update("0000000000000", patch).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.delete("0000000000000").await,
            Err(CoreError::NotFound { .. })
        ));
    }
}
