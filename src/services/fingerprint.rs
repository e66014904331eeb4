//! Change fingerprints
//!
//! A stable SHA-256 digest over the effective inputs of a load, used by the
//! host to decide whether a cached result can be reused.

use crate::error::{MaskLoadError, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Computes change fingerprints
pub struct ChangeFingerprint;

impl ChangeFingerprint {
    /// Digest over a file's content plus the mask payload
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Io` when the file cannot be read
    pub fn for_file_content<P: AsRef<Path>>(path: P, mask_data: Option<&str>) -> Result<String> {
        let path_ref = path.as_ref();
        let mut hasher = Sha256::new();

        let mut file = File::open(path_ref)
            .map_err(|e| MaskLoadError::file_io_error("open file for hashing", path_ref, &e))?;
        std::io::copy(&mut file, &mut hasher)
            .map_err(|e| MaskLoadError::file_io_error("hash file", path_ref, &e))?;

        Ok(Self::finish(hasher, mask_data))
    }

    /// Digest over a location's path string and modification time plus the mask payload
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Io` when the location's metadata cannot be read
    pub fn for_location<P: AsRef<Path>>(path: P, mask_data: Option<&str>) -> Result<String> {
        let path_ref = path.as_ref();
        let mut hasher = Sha256::new();

        hasher.update(path_ref.to_string_lossy().as_bytes());
        hasher.update(Self::modification_time(path_ref)?.as_bytes());

        Ok(Self::finish(hasher, mask_data))
    }

    /// Modification time as decimal seconds since the epoch
    fn modification_time(path: &Path) -> Result<String> {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| MaskLoadError::file_io_error("read modification time", path, &e))?;
        let seconds = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        Ok(seconds.to_string())
    }

    fn finish(mut hasher: Sha256, mask_data: Option<&str>) -> String {
        if let Some(mask) = mask_data.filter(|m| !m.is_empty()) {
            hasher.update(mask.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}
