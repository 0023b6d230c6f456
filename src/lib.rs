//! Implements a client for the commune.cx experimentation API
//!
//! The client activates experiments, reads the variables assigned to a user and
//! tracks custom events. Failures are never returned as errors: they are logged
//! with `tracing` and the operation yields `None`.
//!
//! ```no_run
//! # async fn run() {
//! use commune::{create_client, models::CommuneConfig};
//!
//! let client = create_client(CommuneConfig::new("project_key"));
//! let color = client.get_variant("checkout", "button_color", None).await;
//! # }
//! ```
mod client;
mod http;

pub mod models;
pub use crate::client::Client;

use crate::models::CommuneConfig;

/// Creates a [`Client`] from the given configuration. No request is made.
pub fn create_client(config: CommuneConfig) -> Client {
    Client::new(config)
}
