//! Loads commands from a file on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{info, warn};

use super::{ErrorDetail, Loader, LoaderError, LoaderResult, RawLoader};
use crate::registry::{Registry, RegistrySettings};

/// Reads a file and hands its text to [`RawLoader`].
///
/// A missing file is `FileNotFound`; any other read failure (permissions,
/// invalid UTF-8, a directory) is `FileLoad`.
#[derive(Debug, Clone)]
pub struct FileLoader {
    settings: RegistrySettings,
}

impl FileLoader {
    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self { settings }
    }
}

impl Loader for FileLoader {
    type Input = PathBuf;

    fn new(registry: &Registry) -> Self {
        Self::with_settings(registry.settings().clone())
    }

    fn load(self, path: PathBuf) -> LoaderResult {
        info!("Loading commands from {}", path.display());
        match fs::read_to_string(&path) {
            Ok(content) => RawLoader::with_settings(self.settings).load(content),
            Err(err) => {
                warn!("Failed to read {}: {}", path.display(), err);
                let detail = ErrorDetail::from_io(&path, &err);
                let error = match err.kind() {
                    ErrorKind::NotFound => LoaderError::FileNotFound(detail),
                    _ => LoaderError::FileLoad(detail),
                };
                LoaderResult::failed(error)
            }
        }
    }
}
