use std::fs::File;
use std::io::Read;
use std::path::Path;

use color_eyre::{Result, eyre::Context};

/// Size of the chunks a file is streamed through the hasher in.
const CHUNK_SIZE: usize = 8192;

/// Compute the MD5 hash of a file as lowercase hex.
///
/// This is the checksum format the upload server lists for content it already has.
pub fn compute_md5(path: &Path) -> Result<String> {
    tracing::debug!("Computing MD5 hash for: {}", path.display());

    let mut file = File::open(path).context(format!("Failed to open file: {}", path.display()))?;

    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .context(format!("Failed to read file: {}", path.display()))?;

        if bytes_read == 0 {
            break;
        }

        context.consume(&buffer[..bytes_read]);
    }

    let hash_str = format!("{:x}", context.compute());
    tracing::debug!("Hash computed: {}", hash_str);
    Ok(hash_str)
}
