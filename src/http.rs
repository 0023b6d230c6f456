use anyhow::{anyhow, Result};
use reqwest::{
    header,
    header::{HeaderMap, HeaderValue},
    Client, ClientBuilder, Response, Url,
};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Duration;
use tracing::{event, Level};

use crate::models::Identity;

const API_URL: &str = "https://app.commune.cx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Activate,
    Track,
    Variant,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Activate => "/api/client/experiment/activate",
            Endpoint::Track => "/api/client/experiment/track",
            Endpoint::Variant => "/api/client/experiment/variant",
        }
    }
}

fn create_http_connection_client(timeout: Option<Duration>) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let mut builder = ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(60)))
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .expect("should be able to build the http client")
}

#[derive(Clone)]
pub struct CommuneHttpClient {
    base_url: String,
    http_client: Client,
}

impl CommuneHttpClient {
    pub fn new(api_url: Option<String>, timeout: Option<Duration>) -> Self {
        let base_url = api_url.unwrap_or_else(|| API_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: create_http_connection_client(timeout),
        }
    }

    /// Query parameters are appended in a fixed order: projectKey, commune_device_id,
    /// commune_distinct_id, then experimentKey when it is not empty.
    pub(crate) fn endpoint_url(
        &self,
        endpoint: Endpoint,
        identity: &Identity,
        experiment_key: Option<&str>,
    ) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, endpoint.path());
        let mut url =
            Url::parse(&raw).map_err(|e| anyhow!("invalid commune url {}: {}", raw, e))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("projectKey", &identity.project_key);
            query.append_pair("commune_device_id", &identity.device_id);
            query.append_pair("commune_distinct_id", &identity.distinct_id);
            if let Some(experiment_key) = experiment_key.filter(|key| !key.is_empty()) {
                query.append_pair("experimentKey", experiment_key);
            }
        }
        Ok(url)
    }

    pub async fn get(&self, url: Url) -> Option<Value> {
        event!(Level::DEBUG, "GET {}", url);
        let response = self.http_client.get(url.clone()).send().await;
        read_json(&url, response).await
    }

    pub async fn post<B: Serialize>(&self, url: Url, body: &B) -> Option<Value> {
        event!(Level::DEBUG, "POST {}", url);
        let response = self.http_client.post(url.clone()).json(body).send().await;
        read_json(&url, response).await
    }
}

/// Failed requests are logged and turned into `None`. A body that is not JSON
/// is also `None`, without a log line.
async fn read_json(url: &Url, response: reqwest::Result<Response>) -> Option<Value> {
    let res = match response {
        Ok(result) if result.status().is_success() => result,
        Ok(result) => {
            let status = result.status();
            let text = result.text().await.unwrap_or_default();
            event!(
                Level::ERROR,
                "Request failed: {} {} {} {}",
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                text
            );
            return None;
        }
        Err(err) => {
            event!(Level::ERROR, "Request failed: {} {}", url, err);
            return None;
        }
    };

    res.json::<Value>().await.ok()
}
