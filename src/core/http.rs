//! reqwest-backed [`ApiGateway`] for the REST shape every resource follows

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::audit::ActivityPayload;
use crate::core::envelope::{Envelope, ListPage, PermissionPayload};
use crate::core::gateway::{ApiGateway, GatewayError, ListQuery};
use crate::core::record::RecordId;

const PERMISSION_PATH: &str = "role-permission";
const ACTIVITY_LOG_PATH: &str = "activity-log";

/// HTTP gateway configuration
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "gateway request");
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Envelope<T>, GatewayError> {
        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            // Error bodies usually still carry the envelope with a message
            let message = serde_json::from_str::<Envelope<Value>>(&body)
                .ok()
                .and_then(|env| env.message().map(str::to_string));
            return Err(GatewayError::Status {
                code: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait(?Send)]
impl ApiGateway for HttpGateway {
    async fn list(
        &self,
        resource: &str,
        query: &ListQuery,
    ) -> Result<Envelope<ListPage<Value>>, GatewayError> {
        let req = self.request(Method::GET, resource).query(&query.to_pairs());
        self.send(req).await
    }

    async fn create(&self, resource: &str, body: &Value) -> Result<Envelope<Value>, GatewayError> {
        let req = self.request(Method::POST, resource).json(body);
        self.send(req).await
    }

    async fn update(
        &self,
        resource: &str,
        id: &RecordId,
        body: &Value,
    ) -> Result<Envelope<Value>, GatewayError> {
        let path = format!("{}/{}", resource.trim_end_matches('/'), id);
        let req = self.request(Method::PUT, &path).json(body);
        self.send(req).await
    }

    async fn delete(&self, resource: &str, id: &RecordId) -> Result<Envelope<Value>, GatewayError> {
        let path = format!("{}/{}", resource.trim_end_matches('/'), id);
        let req = self.request(Method::DELETE, &path);
        self.send(req).await
    }

    async fn permissions(&self, route: &str) -> Result<Envelope<PermissionPayload>, GatewayError> {
        let req = self
            .request(Method::GET, PERMISSION_PATH)
            .query(&[("path", route)]);
        self.send(req).await
    }

    async fn record_activity(&self, entry: &ActivityPayload) -> Result<(), GatewayError> {
        // The body of the activity-log response carries nothing the engine uses
        let response = self
            .request(Method::POST, ACTIVITY_LOG_PATH)
            .json(entry)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
            status if status.is_success() => Ok(()),
            status => Err(GatewayError::Status {
                code: status.as_u16(),
                message: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let gw = HttpGateway::new("https://api.example.com/v1/", None, Duration::from_secs(5))
            .unwrap();
        assert_eq!(gw.url("units"), "https://api.example.com/v1/units");
        assert_eq!(gw.url("/units/7"), "https://api.example.com/v1/units/7");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let gw = HttpGateway::new("http://127.0.0.1:9", None, Duration::from_millis(500)).unwrap();
        let err = gw.list("units", &ListQuery::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
