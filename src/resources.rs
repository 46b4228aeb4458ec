use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::RegistryError;

/// A closed set of named resources backed by files under one base directory.
/// Names are logical identifiers, not paths; content is read lazily and
/// cached for the life of the process.
pub struct ResourceStore {
    base_dir: PathBuf,
    names: BTreeSet<String>,
    cache: Mutex<HashMap<String, String>>,
}

impl ResourceStore {
    pub fn new(base_dir: impl Into<PathBuf>, names: impl IntoIterator<Item = String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            names: names.into_iter().collect(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot the files of `base_dir` as the registered set. The listing is
    /// taken once at startup; files added later are not served.
    pub fn from_dir(base_dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let base_dir = base_dir.into();
        let entries = std::fs::read_dir(&base_dir).map_err(|e| RegistryError::Read {
            name: base_dir.display().to_string(),
            source: e,
        })?;

        let mut names = BTreeSet::new();
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                if let Ok(name) = entry.file_name().into_string() {
                    names.insert(name);
                }
            }
        }

        Ok(Self {
            base_dir,
            names,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Resolve a registered name to its content. The first successful resolve
    /// reads the file; later resolves return the cached content. The cache
    /// lock is held across the read so a concurrent first access cannot
    /// trigger a second read.
    pub async fn resolve(&self, name: &str) -> Result<String, RegistryError> {
        if !self.names.contains(name) {
            return Err(RegistryError::NotFound(name.to_string()));
        }

        let path = self.validated_path(name)?;

        let mut cache = self.cache.lock().await;
        if let Some(content) = cache.get(name) {
            return Ok(content.clone());
        }

        let content =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| RegistryError::Read {
                    name: name.to_string(),
                    source: e,
                })?;
        cache.insert(name.to_string(), content.clone());
        Ok(content)
    }

    /// Names are allow-listed above, but a registered name must still resolve
    /// to a plain child of the base directory.
    fn validated_path(&self, name: &str) -> Result<PathBuf, RegistryError> {
        let relative = Path::new(name);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            && relative.components().count() == 1;
        if !plain {
            return Err(RegistryError::Access(format!(
                "resource name escapes base directory: {}",
                name
            )));
        }

        let path = self.base_dir.join(relative);
        if !path.starts_with(&self.base_dir) {
            return Err(RegistryError::Access(format!(
                "resource name escapes base directory: {}",
                name
            )));
        }
        Ok(path)
    }
}
