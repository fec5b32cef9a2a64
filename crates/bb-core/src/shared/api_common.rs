//! Common API types and utilities

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Offset/limit list parameters.
///
/// Defaults: skip 0, at most 10 records. Limit is capped at 1000.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    skip: Option<u64>,
    limit: Option<i64>,
}

impl ListParams {
    pub fn skip(&self) -> u64 {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(0, 1000)
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: Some(0),
            limit: Some(10),
        }
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.skip(), 0);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_list_params_limit_is_clamped() {
        let params: ListParams = serde_json::from_str(r#"{"skip": 5, "limit": 100000}"#).unwrap();
        assert_eq!(params.skip(), 5);
        assert_eq!(params.limit(), 1000);
    }
}
