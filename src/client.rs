use std::sync::PoisonError;

use crossbeam::sync::ShardedLock;
use serde_json::Value;
use tracing::{event, Level};
use uuid::Uuid;

use crate::{
    http::{CommuneHttpClient, Endpoint},
    models::{
        ActivateBody, CommuneConfig, ExperimentResponse, Identity, TrackEvent, TrackPost,
        Variables,
    },
};

/// Commune client bound to one project and device.
///
/// Requests never fail loudly: any error is logged through `tracing` and the
/// operation returns `None`, so callers can fall back to their default behaviour.
///
/// Every operation takes an optional distinct id. When given, it replaces the
/// stored one (see [`Client::set_distinct_id`]) and is used by later calls too.
pub struct Client {
    project_key: String,
    device_id: String,
    distinct_id: ShardedLock<String>,
    http_client: CommuneHttpClient,
}

impl Client {
    pub fn new(config: CommuneConfig) -> Self {
        let device_id = config
            .device_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_device_id);
        let distinct_id = config
            .distinct_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| device_id.clone());

        Self {
            project_key: config.project_key,
            device_id,
            distinct_id: ShardedLock::new(distinct_id),
            http_client: CommuneHttpClient::new(config.api_url, config.timeout),
        }
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn distinct_id(&self) -> String {
        self.distinct_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the distinct id used for all following requests, e.g. after a login.
    pub fn set_distinct_id(&self, distinct_id: impl Into<String>) {
        let mut current = self
            .distinct_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = distinct_id.into();
    }

    /// Activates the experiment for the current identity and returns its variables.
    pub async fn activate(
        &self,
        experiment_key: &str,
        distinct_id: Option<&str>,
    ) -> Option<Variables> {
        let identity = self.identity_for(distinct_id);
        let url = self.url(Endpoint::Activate, &identity, Some(experiment_key))?;
        let body = ActivateBody {
            project_key: self.project_key.clone(),
            experiment_key: experiment_key.to_string(),
        };

        let response = self.http_client.post(url, &body).await?;
        ExperimentResponse::variables_from_value(response)
    }

    /// Fetches the assigned variables without activating the experiment.
    pub async fn get_multivariant(
        &self,
        experiment_key: &str,
        distinct_id: Option<&str>,
    ) -> Option<Variables> {
        let identity = self.identity_for(distinct_id);
        let url = self.url(Endpoint::Variant, &identity, Some(experiment_key))?;

        let response = self.http_client.get(url).await?;
        ExperimentResponse::variables_from_value(response)
    }

    pub async fn get_variant(
        &self,
        experiment_key: &str,
        variable_name: &str,
        distinct_id: Option<&str>,
    ) -> Option<Value> {
        self.get_multivariant(experiment_key, distinct_id)
            .await?
            .remove(variable_name)
    }

    /// Records a custom event. The server response is returned as is.
    pub async fn track(
        &self,
        event_name: &str,
        data: Option<Value>,
        distinct_id: Option<&str>,
    ) -> Option<Value> {
        let identity = self.identity_for(distinct_id);
        let url = self.url(Endpoint::Track, &identity, None)?;
        let body = TrackPost {
            event: TrackEvent::custom(event_name, data, &self.project_key),
        };

        self.http_client.post(url, &body).await
    }
}

// Private methods
impl Client {
    /// Applies the distinct id override, if any, and reads the identity under the same
    /// write guard so a call always uses its own override.
    fn identity_for(&self, distinct_id: Option<&str>) -> Identity {
        let mut current = self
            .distinct_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(distinct_id) = distinct_id {
            *current = distinct_id.to_string();
        }
        Identity {
            project_key: self.project_key.clone(),
            device_id: self.device_id.clone(),
            distinct_id: current.clone(),
        }
    }

    fn url(
        &self,
        endpoint: Endpoint,
        identity: &Identity,
        experiment_key: Option<&str>,
    ) -> Option<reqwest::Url> {
        match self
            .http_client
            .endpoint_url(endpoint, identity, experiment_key)
        {
            Ok(url) => Some(url),
            Err(e) => {
                event!(Level::ERROR, "Failed to build request url: {}", e);
                None
            }
        }
    }
}

fn generate_device_id() -> String {
    Uuid::new_v4().to_string()
}
