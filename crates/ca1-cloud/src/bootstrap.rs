//! cloud-init bootstrap payload
//!
//! The file content is opaque here: it is read as UTF-8 text and attached to
//! the VM as base64 custom data.

use crate::error::{CloudError, Result};
use crate::topology::BOOTSTRAP_FILE;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};

/// Where the bootstrap file is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSource {
    path: PathBuf,
}

impl BootstrapSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `vm_init.yml` in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(BOOTSTRAP_FILE))
    }

    /// `vm_init.yml` relative to the process working directory
    pub fn working_dir() -> Self {
        Self::new(BOOTSTRAP_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and encode the file; a missing file is fatal
    pub async fn load(&self) -> Result<BootstrapPayload> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CloudError::BootstrapFileMissing(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let text = String::from_utf8(bytes).map_err(|e| CloudError::BootstrapFileInvalid {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            "Loaded bootstrap file {} ({} bytes)",
            self.path.display(),
            text.len()
        );
        Ok(BootstrapPayload::from_text(&text))
    }
}

impl Default for BootstrapSource {
    fn default() -> Self {
        Self::working_dir()
    }
}

/// Base64-encoded custom data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPayload {
    encoded: String,
}

impl BootstrapPayload {
    pub fn from_text(text: &str) -> Self {
        Self {
            encoded: STANDARD.encode(text.as_bytes()),
        }
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_payload_is_standard_base64() {
        let payload = BootstrapPayload::from_text("#cloud-config\n");
        assert_eq!(payload.encoded(), "I2Nsb3VkLWNvbmZpZwo=");
    }

    #[tokio::test]
    async fn test_load_from_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("vm_init.yml"),
            "#cloud-config\npackages:\n  - nginx\n",
        )
        .unwrap();

        let payload = BootstrapSource::in_dir(dir.path()).load().await.unwrap();
        let decoded = STANDARD.decode(payload.encoded()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "#cloud-config\npackages:\n  - nginx\n"
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempdir().unwrap();
        let source = BootstrapSource::in_dir(dir.path());

        match source.load().await {
            Err(CloudError::BootstrapFileMissing(path)) => {
                assert!(path.ends_with("vm_init.yml"));
            }
            other => panic!("Expected BootstrapFileMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_utf8_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("vm_init.yml"), [0xff, 0xfe, 0x00]).unwrap();

        let result = BootstrapSource::in_dir(dir.path()).load().await;
        assert!(matches!(
            result,
            Err(CloudError::BootstrapFileInvalid { .. })
        ));
    }
}
