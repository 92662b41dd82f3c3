use color_eyre::eyre::Result;
use reqwest::Client;
use serde_json::Value;

use crate::ibroadcast_rs::{ApiConfig, AuthToken, post_command};

/// Download the complete user library.
///
/// Docs: https://devguide.ibroadcast.com/?p=library
///
/// Returns the raw response; see [`crate::library::Library::from_value`] for decoding.
/// The response can be large, so this is done once per run.
pub async fn get_library(client: &Client, config: &ApiConfig, auth: &AuthToken) -> Result<Value> {
    tracing::debug!("Getting user library");
    post_command(client, config, auth, "library", serde_json::Map::new()).await
}
