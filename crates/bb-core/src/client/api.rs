//! Clients API
//!
//! REST endpoints for the client aggregate. Requests and responses are flat
//! DTOs over the whole aggregate; the service layer decides which records a
//! write actually touches.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::client::entity::{BalanceLog, Client, Contact, Deposit};
use crate::client::service::{ClientAggregate, ClientAggregateService, ClientPatch, NewClientAggregate};
use crate::shared::api_common::{ListParams, SuccessResponse};
use crate::shared::error::CoreError;

/// Create client request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub age: i32,
    pub job: String,
    /// married, single or divorced
    pub marital: String,
    /// primary, secondary, tertiary or unknown
    pub education: String,
    /// Has credit in default
    pub default: bool,
    pub balance: f64,
    /// Has a housing loan
    pub housing: bool,
    /// Has a personal loan
    pub loan: bool,
    /// cellular, telephone or unknown
    pub contact: String,
    /// Day of month of last contact
    pub day: i32,
    /// Three-letter month of last contact
    pub month: String,
    /// Last contact duration in seconds
    pub duration: i32,
    /// Contacts performed during this campaign
    pub campaign: i32,
    /// Days since previous campaign contact, -1 for never
    pub pdays: i32,
    /// Contacts performed before this campaign
    pub previous: i32,
    /// success, failure, other or unknown
    pub poutcome: String,
    /// Has subscribed a term deposit
    pub deposit: bool,
}

/// Update client request. Every field is optional; only present fields change.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
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

/// Client response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: String,
    pub age: i32,
    pub job: String,
    pub marital: String,
    pub education: String,
    pub default: bool,
    pub balance: f64,
    pub housing: bool,
    pub loan: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        Self {
            id: c.id,
            age: c.age,
            job: c.job,
            marital: c.marital.as_str().to_string(),
            education: c.education.as_str().to_string(),
            default: c.default,
            balance: c.balance,
            housing: c.housing,
            loan: c.loan,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Contact response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: String,
    pub client_id: String,
    pub contact: String,
    pub day: i32,
    pub month: String,
    pub duration: i32,
    pub campaign: i32,
    pub pdays: i32,
    pub previous: i32,
    pub poutcome: String,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            client_id: c.client_id,
            contact: c.contact_type.as_str().to_string(),
            day: c.day,
            month: c.month.as_str().to_string(),
            duration: c.duration,
            campaign: c.campaign,
            pdays: c.pdays,
            previous: c.previous,
            poutcome: c.poutcome.as_str().to_string(),
        }
    }
}

/// Deposit response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub id: String,
    pub client_id: String,
    pub deposit: bool,
}

impl From<Deposit> for DepositResponse {
    fn from(d: Deposit) -> Self {
        Self {
            id: d.id,
            client_id: d.client_id,
            deposit: d.deposit,
        }
    }
}

/// Balance log response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceLogResponse {
    pub id: String,
    pub client_id: String,
    pub old_balance: f64,
    pub new_balance: f64,
    pub change_time: String,
}

impl From<BalanceLog> for BalanceLogResponse {
    fn from(l: BalanceLog) -> Self {
        Self {
            id: l.id,
            client_id: l.client_id,
            old_balance: l.old_balance,
            new_balance: l.new_balance,
            change_time: l.change_time.to_rfc3339(),
        }
    }
}

/// Full aggregate response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientAggregateResponse {
    #[serde(flatten)]
    pub client: ClientResponse,
    pub contact: Option<ContactResponse>,
    pub deposit: Option<DepositResponse>,
    pub balance_logs: Vec<BalanceLogResponse>,
}

impl From<ClientAggregate> for ClientAggregateResponse {
    fn from(a: ClientAggregate) -> Self {
        Self {
            client: a.client.into(),
            contact: a.contact.map(Into::into),
            deposit: a.deposit.map(Into::into),
            balance_logs: a.balance_logs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Clients list response (wrapped)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientListResponse {
    pub clients: Vec<ClientResponse>,
    pub total: u64,
}

/// Clients service state
#[derive(Clone)]
pub struct ClientsState {
    pub service: Arc<ClientAggregateService>,
}

/// Create a client with its contact, deposit and initial balance log
#[utoipa::path(
    post,
    path = "",
    tag = "clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientAggregateResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_client(
    State(state): State<ClientsState>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientAggregateResponse>), CoreError> {
    let input = NewClientAggregate {
        age: req.age,
        job: req.job,
        marital: req.marital,
        education: req.education,
        default: req.default,
        balance: req.balance,
        housing: req.housing,
        loan: req.loan,
        contact: req.contact,
        day: req.day,
        month: req.month,
        duration: req.duration,
        campaign: req.campaign,
        pdays: req.pdays,
        previous: req.previous,
        poutcome: req.poutcome,
        deposit: req.deposit,
    };

    let aggregate = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(aggregate.into())))
}

/// List clients (paged, ordered by id)
#[utoipa::path(
    get,
    path = "",
    tag = "clients",
    params(ListParams),
    responses(
        (status = 200, description = "Page of clients", body = ClientListResponse)
    )
)]
pub async fn list_clients(
    State(state): State<ClientsState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ClientListResponse>, CoreError> {
    let page = state.service.list(params.skip(), params.limit()).await?;
    let total = state.service.count().await?;

    Ok(Json(ClientListResponse {
        clients: page.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get a client aggregate by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "clients",
    params(
        ("id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client found", body = ClientAggregateResponse),
        (status = 404, description = "Client not found")
    )
)]
pub async fn get_client(
    State(state): State<ClientsState>,
    Path(id): Path<String>,
) -> Result<Json<ClientAggregateResponse>, CoreError> {
    let aggregate = state.service.get(&id).await?;
    Ok(Json(aggregate.into()))
}

/// Update a client aggregate
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "clients",
    params(
        ("id" = String, Path, description = "Client ID")
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientAggregateResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn update_client(
    State(state): State<ClientsState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClientRequest>,
) -> Result<Json<ClientAggregateResponse>, CoreError> {
    let patch = ClientPatch {
        age: req.age,
        job: req.job,
        marital: req.marital,
        education: req.education,
        default: req.default,
        balance: req.balance,
        housing: req.housing,
        loan: req.loan,
        contact: req.contact,
        day: req.day,
        month: req.month,
        duration: req.duration,
        campaign: req.campaign,
        pdays: req.pdays,
        previous: req.previous,
        poutcome: req.poutcome,
        deposit: req.deposit,
    };

    let aggregate = state.service.update(&id, patch).await?;
    Ok(Json(aggregate.into()))
}

/// Delete a client aggregate (cascades to contact, deposit and balance logs)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "clients",
    params(
        ("id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client deleted", body = SuccessResponse),
        (status = 404, description = "Client not found")
    )
)]
pub async fn delete_client(
    State(state): State<ClientsState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, CoreError> {
    state.service.delete(&id).await?;
    Ok(Json(SuccessResponse::with_message(format!("Client {id} deleted"))))
}

/// Create clients router
pub fn clients_router(state: ClientsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_client, list_clients))
        .routes(routes!(get_client, update_client, delete_client))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_deserializes_partial_body() {
        let req: UpdateClientRequest = serde_json::from_str(r#"{"balance": 1500.0}"#).unwrap();
        assert_eq!(req.balance, Some(1500.0));
        assert!(req.age.is_none());
        assert!(req.contact.is_none());
    }

    #[test]
    fn create_request_uses_camel_case_field_names() {
        let body = r#"{
            "age": 42, "job": "technician", "marital": "married",
            "education": "secondary", "default": false, "balance": 100.0,
            "housing": true, "loan": false, "contact": "cellular",
            "day": 5, "month": "may", "duration": 120, "campaign": 1,
            "pdays": -1, "previous": 0, "poutcome": "unknown", "deposit": true
        }"#;
        let req: CreateClientRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.job, "technician");
        assert!(req.deposit);
        assert_eq!(req.pdays, -1);
    }
}
