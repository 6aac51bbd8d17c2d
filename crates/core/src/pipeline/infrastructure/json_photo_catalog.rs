use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::photo_catalog::PhotoCatalog;
use crate::shared::photo::PhotoRecord;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("session {0} not found in manifest")]
    UnknownSession(String),
}

/// Photo catalog backed by a JSON manifest: `{ "<session id>": [PhotoRecord, ...] }`.
///
/// Relative `pixel_ref` paths are resolved against the manifest's directory.
pub struct JsonPhotoCatalog {
    sessions: HashMap<String, Vec<PhotoRecord>>,
}

impl JsonPhotoCatalog {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut catalog = Self::from_json(&text).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Some(base) = path.parent() {
            catalog.resolve_relative_refs(base);
        }
        Ok(catalog)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            sessions: serde_json::from_str(text)?,
        })
    }

    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn resolve_relative_refs(&mut self, base: &Path) {
        for photo in self.sessions.values_mut().flatten() {
            let pixel_path = Path::new(&photo.pixel_ref);
            if pixel_path.is_relative() {
                photo.pixel_ref = base.join(pixel_path).to_string_lossy().into_owned();
            }
        }
    }
}

impl PhotoCatalog for JsonPhotoCatalog {
    fn photos(
        &self,
        session_id: &str,
    ) -> Result<Vec<PhotoRecord>, Box<dyn std::error::Error + Send + Sync>> {
        self.sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| ManifestError::UnknownSession(session_id.to_string()).into())
    }
}
