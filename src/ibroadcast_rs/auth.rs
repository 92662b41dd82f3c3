use color_eyre::eyre::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::ibroadcast_rs::{
    ApiConfig, AuthToken, CLIENT_NAME, CLIENT_VERSION, ServerError, post_command, send_json,
};
use crate::library::id_string;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    mode: &'a str,
    email_address: &'a str,
    password: &'a str,
    version: &'a str,
    client: &'a str,
    device_name: &'a str,
    supported_types: u8,
}

/// Log in with an email address and password.
///
/// Endpoint
/// - `POST /s/JSON/status`
///
/// Returns
/// - The user id and token every further command is signed with.
///   A response without a `user` object means the credentials were refused.
pub async fn login(
    client: &Client,
    config: &ApiConfig,
    email_address: &str,
    password: &str,
) -> Result<AuthToken> {
    tracing::debug!("Logging in as {}", email_address);

    let request = LoginRequest {
        mode: "status",
        email_address,
        password,
        version: CLIENT_VERSION,
        client: CLIENT_NAME,
        device_name: &config.device_name,
        supported_types: 1,
    };
    let url = config.api_url.join("status")?;
    let response = send_json(client.post(url).json(&request), "status").await?;

    let token = parse_login_response(&response)?;
    tracing::debug!("Login successful");
    Ok(token)
}

fn parse_login_response(response: &Value) -> Result<AuthToken, ServerError> {
    let Some(user) = response.get("user") else {
        tracing::error!("Invalid login");
        return Err(ServerError::InvalidLogin);
    };

    let user_id = user.get("id").and_then(id_string);
    let token = user.get("token").and_then(id_string);
    match (user_id, token) {
        (Some(user_id), Some(token)) => Ok(AuthToken { user_id, token }),
        _ => Err(ServerError::UnexpectedResponse {
            reason: "login response is missing the user id or token".to_string(),
        }),
    }
}

/// End the session on the server side.
pub async fn logout(client: &Client, config: &ApiConfig, auth: &AuthToken) -> Result<()> {
    tracing::debug!("Logging out");
    post_command(client, config, auth, "logout", serde_json::Map::new()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_login_response() {
        let response = json!({
            "result": true,
            "user": { "id": 1234, "token": "abcd-efgh" }
        });
        assert_eq!(
            parse_login_response(&response).unwrap(),
            AuthToken {
                user_id: "1234".to_string(),
                token: "abcd-efgh".to_string()
            }
        );
    }

    #[test]
    fn test_parse_login_response_without_user() {
        let response = json!({ "result": false, "message": "Invalid credentials" });
        assert_eq!(
            parse_login_response(&response).unwrap_err(),
            ServerError::InvalidLogin
        );
    }

    #[test]
    fn test_parse_login_response_without_token() {
        let response = json!({ "user": { "id": "1234" } });
        assert!(matches!(
            parse_login_response(&response).unwrap_err(),
            ServerError::UnexpectedResponse { .. }
        ));
    }

    #[test]
    fn test_login_request_shape() {
        let request = LoginRequest {
            mode: "status",
            email_address: "me@example.com",
            password: "hunter2",
            version: CLIENT_VERSION,
            client: CLIENT_NAME,
            device_name: "laptop",
            supported_types: 1,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["mode"], "status");
        assert_eq!(value["email_address"], "me@example.com");
        assert_eq!(value["supported_types"], 1);
    }
}
