//! Upload endpoints. These are not part of the documented API; they are the
//! ones the official uploader script talks to.

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use reqwest::{Body, Client};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use crate::ibroadcast_rs::{
    ApiConfig, AuthToken, CLIENT_NAME, ServerError, command_result, post_command, send_json,
};

/// Fetch the MD5 checksums of every file the server already has for this user.
pub async fn get_md5s(client: &Client, config: &ApiConfig, auth: &AuthToken) -> Result<Vec<String>> {
    tracing::debug!("Getting user MD5 checksums");

    let form = [("user_id", auth.user_id.as_str()), ("token", auth.token.as_str())];
    let request = client.post(config.upload_url.clone()).form(&form);
    let response = send_json(request, "md5").await?;

    let md5s = parse_md5s(&response)?;
    tracing::debug!("Loaded {} checksums", md5s.len());
    Ok(md5s)
}

fn parse_md5s(response: &Value) -> Result<Vec<String>, ServerError> {
    let unexpected = || ServerError::UnexpectedResponse {
        reason: "no `md5` list in checksum response".to_string(),
    };
    response
        .get("md5")
        .and_then(Value::as_array)
        .ok_or_else(unexpected)?
        .iter()
        .map(|md5| md5.as_str().map(str::to_lowercase).ok_or_else(unexpected))
        .collect()
}

/// Fetch the file extensions the server accepts for upload, e.g. `.mp3`.
pub async fn get_supported_filetypes(
    client: &Client,
    config: &ApiConfig,
    auth: &AuthToken,
) -> Result<Vec<String>> {
    tracing::debug!("Getting supported filetypes");
    let response =
        post_command(client, config, auth, "status", json!({ "supported_types": 1 })).await?;
    Ok(parse_supported_filetypes(&response)?)
}

fn parse_supported_filetypes(response: &Value) -> Result<Vec<String>, ServerError> {
    let supported = response
        .get("supported")
        .and_then(Value::as_array)
        .ok_or_else(|| ServerError::UnexpectedResponse {
            reason: "no `supported` list in status response".to_string(),
        })?;

    Ok(supported
        .iter()
        .filter_map(|filetype| filetype.get("extension").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Upload a single file. Returns the server's `result` flag.
pub async fn upload_file(
    client: &Client,
    config: &ApiConfig,
    auth: &AuthToken,
    path: &Path,
) -> Result<bool> {
    tracing::debug!("Uploading file {}", path.display());

    let file = tokio::fs::File::open(path)
        .await
        .wrap_err_with(|| format!("Failed to open file: {}", path.display()))?;
    let length = file
        .metadata()
        .await
        .wrap_err_with(|| format!("Failed to read file metadata: {}", path.display()))?
        .len();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let form = Form::new()
        .text("user_id", auth.user_id.clone())
        .text("token", auth.token.clone())
        .text("file_path", path.display().to_string())
        .text("method", CLIENT_NAME)
        .part(
            "file",
            Part::stream_with_length(Body::from(file), length).file_name(file_name),
        );

    let request = client.post(config.upload_url.clone()).multipart(form);
    let response = send_json(request, "upload").await?;
    Ok(command_result(&response))
}
