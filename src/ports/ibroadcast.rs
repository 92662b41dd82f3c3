use std::path::Path;

use color_eyre::eyre::Result;
use serde_json::Value;

use crate::ibroadcast_rs::{AuthToken, NewPlaylist};

/// Port trait wrapping the iBroadcast API calls used by the session.
///
/// Implementations live in `services::ibroadcast::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IBroadcastClient: Send + Sync {
    async fn login(&self, email_address: &str, password: &str) -> Result<AuthToken>;

    async fn logout(&self, auth: &AuthToken) -> Result<()>;

    async fn get_library(&self, auth: &AuthToken) -> Result<Value>;

    async fn get_md5s(&self, auth: &AuthToken) -> Result<Vec<String>>;

    async fn get_supported_filetypes(&self, auth: &AuthToken) -> Result<Vec<String>>;

    async fn create_playlist(&self, auth: &AuthToken, playlist: &NewPlaylist) -> Result<bool>;

    async fn delete_playlist(&self, auth: &AuthToken, playlist_id: &str) -> Result<bool>;

    async fn upload_track(&self, auth: &AuthToken, path: &Path) -> Result<bool>;
}
