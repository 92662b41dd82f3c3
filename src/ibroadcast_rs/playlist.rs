use color_eyre::eyre::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::ibroadcast_rs::{ApiConfig, AuthToken, command_result, post_command};

/// A playlist to create on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub track_ids: Vec<String>,
    pub public: bool,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistParams<'a> {
    name: &'a str,
    description: &'a str,
    tracks: Vec<Value>,
    make_public: bool,
}

#[derive(Debug, Serialize)]
struct DeletePlaylistParams {
    playlist_id: Vec<Value>,
}

/// Track and playlist ids are numeric on the server; send them as numbers when they are.
fn id_value(id: &str) -> Value {
    match id.parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id),
    }
}

/// Create a playlist holding `playlist.track_ids` in order.
///
/// Returns the server's `result` flag.
pub async fn create_playlist(
    client: &Client,
    config: &ApiConfig,
    auth: &AuthToken,
    playlist: &NewPlaylist,
) -> Result<bool> {
    tracing::debug!(
        "Create playlist {} with {} tracks",
        playlist.name,
        playlist.track_ids.len()
    );

    let params = CreatePlaylistParams {
        name: &playlist.name,
        description: &playlist.description,
        tracks: playlist.track_ids.iter().map(|id| id_value(id)).collect(),
        make_public: playlist.public,
    };
    let response = post_command(client, config, auth, "createplaylist", params).await?;
    Ok(command_result(&response))
}

/// Delete a playlist by id. Returns the server's `result` flag.
pub async fn delete_playlist(
    client: &Client,
    config: &ApiConfig,
    auth: &AuthToken,
    playlist_id: &str,
) -> Result<bool> {
    tracing::debug!("Delete playlist {}", playlist_id);

    let params = DeletePlaylistParams {
        playlist_id: vec![id_value(playlist_id)],
    };
    let response = post_command(client, config, auth, "deleteplaylist", params).await?;
    Ok(command_result(&response))
}
