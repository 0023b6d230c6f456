use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::{serde_as, NoneAsEmptyString};

/// Event type used for every event sent through `track`.
const CUSTOM_EVENT_TYPE: &str = "custom";

/// Variable values of an experiment, keyed by variable name.
pub type Variables = HashMap<String, Value>;

/// Options to use when creating the client.
///
/// Only `project_key` is required. When `device_id` is missing a random v4 UUID is
/// generated, and `distinct_id` defaults to the device id. Empty strings count as missing.
///
/// The default value for api_url is https://app.commune.cx
/// There is no request timeout unless `timeout` is set.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuneConfig {
    pub project_key: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub distinct_id: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl CommuneConfig {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            device_id: None,
            distinct_id: None,
            api_url: None,
            timeout: None,
        }
    }
}

/// Snapshot of the identity a request is made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub project_key: String,
    pub device_id: String,
    pub distinct_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Variable {
    pub name: String,
    pub variant: Variant,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Variant {
    #[serde(default)]
    pub value: Value,
}

/// Response of the activate and variant endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExperimentResponse {
    pub variables: Option<Vec<Variable>>,
}

impl ExperimentResponse {
    /// Collapses the variables list into a name -> value map.
    /// Later entries win when a name is repeated.
    pub fn into_variables(self) -> Option<Variables> {
        self.variables.map(|variables| {
            variables
                .into_iter()
                .map(|variable| (variable.name, variable.variant.value))
                .collect()
        })
    }

    /// Returns `None` when the body is not an experiment response or carries no variables.
    pub fn variables_from_value(body: Value) -> Option<Variables> {
        serde_json::from_value::<ExperimentResponse>(body)
            .ok()?
            .into_variables()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateBody {
    pub project_key: String,
    pub experiment_key: String,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct TrackPost {
    pub event: TrackEvent,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct TrackEvent {
    pub r#type: String,
    pub name: String,
    pub data: Value,
    pub project_id: String,
}

impl TrackEvent {
    /// A `null` or missing payload is sent as an empty object.
    pub fn custom(name: &str, data: Option<Value>, project_id: &str) -> Self {
        let data = match data {
            None | Some(Value::Null) => json!({}),
            Some(data) => data,
        };
        Self {
            r#type: CUSTOM_EVENT_TYPE.to_string(),
            name: name.to_string(),
            data,
            project_id: project_id.to_string(),
        }
    }
}
