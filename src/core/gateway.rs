//! ApiGateway - the engine's only door to the backend
//!
//! Every call resolves to the uniform [`Envelope`]. Implementations attach the
//! bearer credential and own timeouts/retries; the engine never retries.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::audit::ActivityPayload;
use crate::core::envelope::{Envelope, ListPage, PermissionPayload};
use crate::core::pagination::SortDirection;
use crate::core::record::RecordId;

/// Errors raised by a gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server returned {code}{}", .message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status { code: u16, message: Option<String> },

    #[error("Session expired or credential rejected; sign in again")]
    Unauthorized,

    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message the server attached to the failure, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Status {
                message: Some(m), ..
            } if !m.trim().is_empty() => Some(m.trim()),
            _ => None,
        }
    }
}

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub rows: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            rows: 20,
            search: None,
            sort_by: None,
            sort_direction: SortDirection::Ascending,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    /// Query-string pairs in wire order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("rows".to_string(), self.rows.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy".to_string(), sort_by.clone()));
            pairs.push((
                "sortDirection".to_string(),
                self.sort_direction.as_str().to_string(),
            ));
        }
        for (key, value) in &self.filters {
            pairs.push((key.clone(), value.clone()));
        }
        pairs
    }
}

/// Backend operations used by the engine
///
/// Futures are not `Send`: the engine runs on a single-threaded executor and
/// its components keep state in `RefCell`s.
#[async_trait(?Send)]
pub trait ApiGateway {
    /// `GET /{resource}` with paging, sort, search and filters
    async fn list(
        &self,
        resource: &str,
        query: &ListQuery,
    ) -> Result<Envelope<ListPage<Value>>, GatewayError>;

    /// `POST /{resource}`
    async fn create(&self, resource: &str, body: &Value) -> Result<Envelope<Value>, GatewayError>;

    /// `PUT /{resource}/{id}`
    async fn update(
        &self,
        resource: &str,
        id: &RecordId,
        body: &Value,
    ) -> Result<Envelope<Value>, GatewayError>;

    /// `DELETE /{resource}/{id}`
    async fn delete(&self, resource: &str, id: &RecordId) -> Result<Envelope<Value>, GatewayError>;

    /// `GET /role-permission?path=<route>`
    async fn permissions(&self, route: &str) -> Result<Envelope<PermissionPayload>, GatewayError>;

    /// `POST /activity-log`
    async fn record_activity(&self, entry: &ActivityPayload) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_unset_parameters() {
        let query = ListQuery::default();
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("rows".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_full() {
        let mut filters = BTreeMap::new();
        filters.insert("building_id".to_string(), "7".to_string());
        let query = ListQuery {
            page: 3,
            rows: 50,
            search: Some("north".to_string()),
            sort_by: Some("code".to_string()),
            sort_direction: SortDirection::Descending,
            filters,
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("search".to_string(), "north".to_string())));
        assert!(pairs.contains(&("sortBy".to_string(), "code".to_string())));
        assert!(pairs.contains(&("sortDirection".to_string(), "desc".to_string())));
        assert!(pairs.contains(&("building_id".to_string(), "7".to_string())));
    }

    #[test]
    fn test_server_message() {
        let err = GatewayError::Status {
            code: 422,
            message: Some("Code already exists".to_string()),
        };
        assert_eq!(err.server_message(), Some("Code already exists"));
        assert_eq!(err.to_string(), "Server returned 422: Code already exists");
        assert!(GatewayError::Transport("timeout".into()).server_message().is_none());
    }
}
