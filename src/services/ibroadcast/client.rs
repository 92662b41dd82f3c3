use std::path::Path;

use color_eyre::eyre::Result;
use reqwest::Client;
use serde_json::Value;

use crate::ibroadcast_rs::{
    self, ApiConfig, AuthToken, NewPlaylist, create_playlist, delete_playlist, get_library,
    get_md5s, get_supported_filetypes, login, logout, upload_file,
};
use crate::ports::ibroadcast::IBroadcastClient;

pub struct IBroadcastHttpAdapter {
    client: Client,
    config: ApiConfig,
}

impl IBroadcastHttpAdapter {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                ibroadcast_rs::CLIENT_NAME,
                ibroadcast_rs::CLIENT_VERSION
            ))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl IBroadcastClient for IBroadcastHttpAdapter {
    async fn login(&self, email_address: &str, password: &str) -> Result<AuthToken> {
        login(&self.client, &self.config, email_address, password).await
    }

    async fn logout(&self, auth: &AuthToken) -> Result<()> {
        logout(&self.client, &self.config, auth).await
    }

    async fn get_library(&self, auth: &AuthToken) -> Result<Value> {
        get_library(&self.client, &self.config, auth).await
    }

    async fn get_md5s(&self, auth: &AuthToken) -> Result<Vec<String>> {
        get_md5s(&self.client, &self.config, auth).await
    }

    async fn get_supported_filetypes(&self, auth: &AuthToken) -> Result<Vec<String>> {
        get_supported_filetypes(&self.client, &self.config, auth).await
    }

    async fn create_playlist(&self, auth: &AuthToken, playlist: &NewPlaylist) -> Result<bool> {
        create_playlist(&self.client, &self.config, auth, playlist).await
    }

    async fn delete_playlist(&self, auth: &AuthToken, playlist_id: &str) -> Result<bool> {
        delete_playlist(&self.client, &self.config, auth, playlist_id).await
    }

    async fn upload_track(&self, auth: &AuthToken, path: &Path) -> Result<bool> {
        upload_file(&self.client, &self.config, auth, path).await
    }
}
