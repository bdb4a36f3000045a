//! Per-request scratch file for uploaded audio.
//!
//! The speech model reads from a path, so each upload is persisted to a
//! uniquely named temporary file. [`ScratchAudio`] owns that file and removes
//! it when dropped, which covers the success path, every early `?` return and
//! unwinding. A failed removal is logged and otherwise ignored.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

use super::base::SttError;

const SCRATCH_PREFIX: &str = "voxchat-upload-";
const DEFAULT_EXTENSION: &str = "wav";

/// Temporary copy of an uploaded audio file, deleted on drop.
#[derive(Debug)]
pub struct ScratchAudio {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl ScratchAudio {
    /// Write `bytes` to a fresh scratch file.
    ///
    /// The extension is taken from the client's file name when it looks sane
    /// (decoders use it as a format hint) and defaults to `.wav`.
    pub fn create(
        bytes: &[u8],
        file_name: Option<&str>,
        dir: Option<&Path>,
    ) -> Result<Self, SttError> {
        let suffix = format!(".{}", extension_hint(file_name));

        let mut builder = Builder::new();
        builder.prefix(SCRATCH_PREFIX).suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| SttError::ScratchFile(format!("create: {e}")))?;

        // Close the handle before the model opens the path
        let path = file.path().to_path_buf();
        let written = file.write_all(bytes).and_then(|()| file.flush());
        let scratch = Self {
            path: path.clone(),
            temp: Some(file.into_temp_path()),
        };
        written.map_err(|e| SttError::ScratchFile(format!("write {}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Stored upload in scratch file");
        Ok(scratch)
    }

    /// Location of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchAudio {
    fn drop(&mut self) {
        let Some(temp_path) = self.temp.take() else {
            return;
        };
        match temp_path.close() {
            Ok(()) => debug!(path = %self.path.display(), "Removed scratch file"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Could not delete scratch file; leaving it for the OS to clean up"
            ),
        }
    }
}

/// Pick a short alphanumeric extension from the uploaded file name.
fn extension_hint(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
