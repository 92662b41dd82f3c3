pub mod client;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{OptionExt, Result};

use crate::ibroadcast_rs::{AuthToken, NewPlaylist, ServerError};
use crate::library::{FieldPolicy, Library};
use crate::ports::ibroadcast::IBroadcastClient;
use crate::selection::Selection;
use crate::upload::{
    ChecksumSet, UploadDecision, UploadError, UploadOutcome, UploadSummary, checksum_of,
    record_upload_result, should_upload,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub field_policy: FieldPolicy,
    /// Allow the checksum, file type and upload endpoints, which are not part of the public API
    pub allow_undocumented_apis: bool,
}

/// One logged-in run against the service.
///
/// The library and the server's checksums are fetched lazily, at most once,
/// and then kept for the rest of the run. Uploads update the checksums so
/// identical content is not sent twice.
pub struct IBroadcastService<C: IBroadcastClient> {
    client: C,
    options: SessionOptions,
    auth: Option<AuthToken>,
    library: Option<Library>,
    selection: Selection,
    checksums: Option<ChecksumSet>,
}

impl<C: IBroadcastClient> IBroadcastService<C> {
    pub fn new(client: C, options: SessionOptions) -> Self {
        Self {
            client,
            options,
            auth: None,
            library: None,
            selection: Selection::new(),
            checksums: None,
        }
    }

    // ---- Shared helpers ----

    fn auth(&self) -> Result<&AuthToken> {
        self.auth
            .as_ref()
            .ok_or_eyre("Not logged in. Call login first.")
    }

    fn require_undocumented_apis(&self) -> Result<()> {
        if self.options.allow_undocumented_apis {
            Ok(())
        } else {
            Err(ServerError::UndocumentedApisDisabled.into())
        }
    }

    async fn ensure_library(&mut self) -> Result<()> {
        if self.library.is_none() {
            self.refresh_library().await?;
        }
        Ok(())
    }

    async fn ensure_checksums(&mut self) -> Result<()> {
        if self.checksums.is_none() {
            let md5s = self.client.get_md5s(self.auth()?).await?;
            let checksums: ChecksumSet = md5s.into_iter().collect();
            if checksums.is_empty() {
                tracing::debug!("Server has no uploaded content yet");
            }
            self.checksums = Some(checksums);
        }
        Ok(())
    }

    // ---- Authentication ----

    pub async fn login(&mut self, email_address: &str, password: &str) -> Result<()> {
        let auth = self.client.login(email_address, password).await?;
        self.auth = Some(auth);
        Ok(())
    }

    /// Log out if logged in. The local state is dropped either way.
    pub async fn logout(&mut self) -> Result<()> {
        if let Some(auth) = self.auth.take() {
            self.client.logout(&auth).await?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn is_logged_in(&self) -> bool {
        self.auth.is_some()
    }

    // ---- Library ----

    /// The library snapshot, fetched on first use.
    pub async fn library(&mut self) -> Result<&Library> {
        self.ensure_library().await?;
        self.library.as_ref().ok_or_eyre("Library was not loaded")
    }

    /// Fetch the library from the server, replacing any earlier snapshot.
    pub async fn refresh_library(&mut self) -> Result<&Library> {
        let raw = self.client.get_library(self.auth()?).await?;
        let library = Library::from_value(&raw, self.options.field_policy)?;
        tracing::debug!(
            "Library has {} albums, {} tracks, {} playlists",
            library.albums().len(),
            library.tracks().len(),
            library.playlists().len()
        );
        Ok(&*self.library.insert(library))
    }

    // ---- Selection ----

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub async fn select_albums_by_name(&mut self, filter: &str, append: bool) -> Result<usize> {
        self.ensure_library().await?;
        let library = self.library.as_ref().ok_or_eyre("Library was not loaded")?;
        Ok(self.selection.select_albums_by_name(library, filter, append))
    }

    pub async fn select_tracks_by_folder(&mut self, folder: &str, append: bool) -> Result<usize> {
        self.ensure_library().await?;
        let library = self.library.as_ref().ok_or_eyre("Library was not loaded")?;
        Ok(self.selection.select_tracks_by_folder(library, folder, append))
    }

    pub async fn playlist_track_list(&mut self) -> Result<Vec<String>> {
        self.ensure_library().await?;
        let library = self.library.as_ref().ok_or_eyre("Library was not loaded")?;
        Ok(self.selection.playlist_track_list(library))
    }

    // ---- Playlists ----

    /// Create a playlist from the current selection.
    ///
    /// An existing playlist with the same name is deleted first.
    pub async fn create_playlist(
        &mut self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<()> {
        self.delete_playlist(name).await?;

        tracing::debug!("Create playlist {}", name);
        let playlist = NewPlaylist {
            name: name.to_string(),
            description: description.to_string(),
            track_ids: self.playlist_track_list().await?,
            public,
        };

        if self.client.create_playlist(self.auth()?, &playlist).await? {
            tracing::info!(
                "Created playlist {} with {} tracks",
                name,
                playlist.track_ids.len()
            );
            Ok(())
        } else {
            Err(ServerError::CommandFailed {
                command: "createplaylist".to_string(),
            }
            .into())
        }
    }

    /// Delete the playlist called `name`. Returns false if there is no such
    /// playlist or the server refused.
    pub async fn delete_playlist(&mut self, name: &str) -> Result<bool> {
        self.ensure_library().await?;
        let Some(playlist_id) = self
            .library
            .as_ref()
            .and_then(|library| library.playlist_by_name(name))
            .map(|playlist| playlist.id.clone())
        else {
            return Ok(false);
        };

        tracing::debug!("Delete playlist {}", name);
        let deleted = self
            .client
            .delete_playlist(self.auth()?, &playlist_id)
            .await?;
        if deleted {
            if let Some(library) = self.library.as_mut() {
                library.remove_playlist(&playlist_id);
            }
        } else {
            tracing::warn!("Server did not delete playlist {}", name);
        }
        Ok(deleted)
    }

    // ---- Uploads ----

    pub async fn supported_filetypes(&self) -> Result<Vec<String>> {
        self.require_undocumented_apis()?;
        self.client.get_supported_filetypes(self.auth()?).await
    }

    /// Upload one file unless the server already has its content.
    ///
    /// Problems with this particular file come back as [`UploadOutcome::Failed`];
    /// an `Err` means the session itself is unusable (not logged in, checksums
    /// could not be fetched, ...).
    pub async fn upload_track(&mut self, path: &Path, force: bool) -> Result<UploadOutcome> {
        self.require_undocumented_apis()?;
        self.ensure_checksums().await?;
        let checksums = self.checksums.get_or_insert_with(ChecksumSet::new);

        let checksum = match should_upload(checksums, path, force) {
            Ok(UploadDecision::Skip { .. }) => {
                tracing::info!(
                    "File {} has already been uploaded, skipping.",
                    path.display()
                );
                return Ok(UploadOutcome::Skipped);
            }
            Ok(UploadDecision::Upload { checksum }) => checksum,
            Err(e) => return Ok(UploadOutcome::Failed(e)),
        };

        let succeeded = match self.client.upload_track(self.auth()?, path).await {
            Ok(succeeded) => succeeded,
            Err(e) => {
                return Ok(UploadOutcome::Failed(UploadError::Transfer {
                    path: path.display().to_string(),
                    reason: format!("{e:#}"),
                }));
            }
        };
        if !succeeded {
            return Ok(UploadOutcome::Failed(UploadError::Rejected {
                path: path.display().to_string(),
            }));
        }

        // Forced uploads skipped hashing; do it now so later files in the batch benefit
        let checksum = match checksum {
            Some(checksum) => Some(checksum),
            None => checksum_of(path)
                .inspect_err(|e| tracing::warn!("Uploaded but could not record checksum: {}", e))
                .ok(),
        };
        if let Some(checksum) = checksum {
            let checksums = self.checksums.get_or_insert_with(ChecksumSet::new);
            record_upload_result(checksums, checksum, true);
        }

        tracing::info!("Uploaded {}", path.display());
        Ok(UploadOutcome::Uploaded)
    }

    /// Upload files one after the other. A failed file does not stop the batch.
    pub async fn upload_files(&mut self, paths: &[PathBuf], force: bool) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();

        for (i, path) in paths.iter().enumerate() {
            tracing::info!("Processing file ({}/{}): {}", i + 1, paths.len(), path.display());

            let outcome = self.upload_track(path, force).await?;
            if let UploadOutcome::Failed(e) = &outcome {
                tracing::warn!("{}", e);
            }
            summary.record(&outcome);
        }

        tracing::info!(
            "Upload complete: {} uploaded, {} skipped, {} failed, {} total",
            summary.uploaded,
            summary.skipped,
            summary.failed,
            summary.total()
        );
        Ok(summary)
    }

    /// Number of checksums known so far, if they were fetched.
    pub fn known_checksums(&self) -> Option<usize> {
        self.checksums.as_ref().map(ChecksumSet::len)
    }
}
