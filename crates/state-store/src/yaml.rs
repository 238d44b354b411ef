use crate::{RawState, StateError, StateResult, StateStorage};
use std::path::{Path, PathBuf};

/// Owner read/write only; the state file may carry user identifiers.
const STATE_FILE_MODE: u32 = 0o600;

/// [`StateStorage`] backed by a YAML document.
#[derive(Debug, Clone)]
pub struct YamlStorage {
    path: PathBuf,
}

impl YamlStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStorage for YamlStorage {
    fn read(&self) -> StateResult<RawState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RawState::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(RawState::new());
        }

        serde_yaml::from_str(&content).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, state: &RawState) -> StateResult<()> {
        let content = serde_yaml::to_string(state).map_err(StateError::Serialize)?;
        ddev_config_and_utils::fs::atomic_write(&self.path, content.as_bytes(), STATE_FILE_MODE)?;
        Ok(())
    }
}
