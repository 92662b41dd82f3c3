use color_eyre::eyre::{Result, WrapErr};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub mod auth;
pub mod library;
pub mod playlist;
pub mod upload;

pub use auth::{login, logout};
pub use library::get_library;
pub use playlist::{NewPlaylist, create_playlist, delete_playlist};
pub use upload::{get_md5s, get_supported_filetypes, upload_file};

pub const DEFAULT_API_URL: &str = "https://json.ibroadcast.com/s/JSON/";
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.ibroadcast.com";
pub const CLIENT_NAME: &str = "ibroadcast-manager";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Docs:
/// https://devguide.ibroadcast.com/
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_url: Url,
    pub upload_url: Url,
    pub device_name: String,
}

impl ApiConfig {
    pub fn new(api_url: &str, upload_url: &str, device_name: &str) -> Result<Self> {
        Ok(Self {
            api_url: Url::parse(api_url).wrap_err_with(|| format!("Invalid API url: {api_url}"))?,
            upload_url: Url::parse(upload_url)
                .wrap_err_with(|| format!("Invalid upload url: {upload_url}"))?,
            device_name: device_name.to_string(),
        })
    }
}

/// Credentials handed out by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ServerError {
    #[error("Invalid login")]
    InvalidLogin,

    #[error("Server returned bad status on command {command}: status code {status}")]
    BadStatus { command: String, status: u16 },

    #[error("Server returned a response we do not understand: {reason}")]
    UnexpectedResponse { reason: String },

    #[error("Server did not accept command {command}")]
    CommandFailed { command: String },

    #[error("Undocumented APIs have not been enabled")]
    UndocumentedApisDisabled,
}

/// The JSON body every command on the JSON endpoint is wrapped in.
#[derive(Debug, Serialize)]
struct CommandEnvelope<'a, P: Serialize> {
    mode: &'a str,
    user_id: &'a str,
    token: &'a str,
    device_name: &'a str,
    version: &'a str,
    client: &'a str,
    #[serde(flatten)]
    params: P,
}

/// Post an authenticated command to the JSON endpoint.
pub(crate) async fn post_command<P: Serialize>(
    client: &Client,
    config: &ApiConfig,
    auth: &AuthToken,
    mode: &str,
    params: P,
) -> Result<Value> {
    let envelope = CommandEnvelope {
        mode,
        user_id: &auth.user_id,
        token: &auth.token,
        device_name: &config.device_name,
        version: CLIENT_VERSION,
        client: CLIENT_NAME,
        params,
    };
    let url = config.api_url.join(mode)?;
    send_json(client.post(url).json(&envelope), mode).await
}

/// Send a prepared request and decode the JSON response.
pub(crate) async fn send_json(request: RequestBuilder, command: &str) -> Result<Value> {
    let res = request
        .header("Accept", "application/json")
        .send()
        .await
        .wrap_err_with(|| format!("Server connection error on command {command}"))?;

    let status = res.status();
    if !status.is_success() {
        tracing::error!("Server returned bad status on command {}: {}", command, status);
        return Err(ServerError::BadStatus {
            command: command.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    res.json::<Value>()
        .await
        .wrap_err_with(|| format!("Failed to deserialize response to command {command}"))
}

/// Read the boolean `result` flag most commands answer with.
pub(crate) fn command_result(response: &Value) -> bool {
    response
        .get("result")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
