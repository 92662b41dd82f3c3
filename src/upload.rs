use std::collections::HashSet;
use std::path::Path;

use crate::file_hash;

/// Checksums of content the upload server already has.
///
/// Only ever grows during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumSet {
    checksums: HashSet<String>,
}

impl ChecksumSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, checksum: &str) -> bool {
        self.checksums.contains(checksum)
    }

    /// Returns false if the checksum was already known.
    pub fn insert(&mut self, checksum: String) -> bool {
        self.checksums.insert(checksum)
    }

    pub fn len(&self) -> usize {
        self.checksums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checksums.is_empty()
    }
}

impl FromIterator<String> for ChecksumSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            checksums: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDecision {
    /// The server already has this content
    Skip { checksum: String },
    /// Transfer the file. The checksum is `None` for forced uploads,
    /// which don't hash the file up front.
    Upload { checksum: Option<String> },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Hash computation error for {path}: {message}")]
    ChecksumComputation { path: String, message: String },

    #[error("Upload of {path} failed: {reason}")]
    Transfer { path: String, reason: String },

    #[error("Upload of {path} was rejected by the server")]
    Rejected { path: String },
}

/// How a single file in a batch ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Skipped,
    Uploaded,
    Failed(UploadError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl UploadSummary {
    pub fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Skipped => self.skipped += 1,
            UploadOutcome::Uploaded => self.uploaded += 1,
            UploadOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.uploaded + self.skipped + self.failed
    }
}

pub fn checksum_of(path: &Path) -> Result<String, UploadError> {
    file_hash::compute_md5(path).map_err(|e| UploadError::ChecksumComputation {
        path: path.display().to_string(),
        message: format!("{e:#}"),
    })
}

/// Decide whether `path` has to be transferred.
///
/// A forced upload never reads the file here. Otherwise the file is hashed
/// and skipped when the server already lists that checksum.
pub fn should_upload(
    checksums: &ChecksumSet,
    path: &Path,
    force: bool,
) -> Result<UploadDecision, UploadError> {
    if force {
        return Ok(UploadDecision::Upload { checksum: None });
    }

    let checksum = checksum_of(path)?;
    if checksums.contains(&checksum) {
        Ok(UploadDecision::Skip { checksum })
    } else {
        Ok(UploadDecision::Upload {
            checksum: Some(checksum),
        })
    }
}

/// Fold the result of a transfer back into the known checksums.
pub fn record_upload_result(checksums: &mut ChecksumSet, checksum: String, succeeded: bool) {
    if succeeded {
        checksums.insert(checksum);
    }
}
