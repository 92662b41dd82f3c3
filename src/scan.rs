use std::path::{Path, PathBuf};

/// Normalise an extension like `.MP3` to `mp3`.
fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&normalize_extension(e)))
        .unwrap_or(false)
}

/// Collect the files under `root` that have one of `extensions`.
///
/// `root` itself is returned when it is a file, whatever its extension.
/// `max_depth` of 1 only looks at the direct children of `root`.
/// The result is sorted so batches run in a stable order.
pub fn collect_audio_files(
    root: &Path,
    extensions: &[String],
    max_depth: Option<usize>,
) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let extensions: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();

    let mut walker = walkdir::WalkDir::new(root);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), &extensions))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    tracing::debug!("Found {} files under {}", files.len(), root.display());
    files
}
