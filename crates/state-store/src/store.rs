use crate::weak::from_value_weak;
use crate::{StateError, StateResult, YamlStorage};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Untyped contents of the state file, keyed by state key.
pub type RawState = BTreeMap<String, serde_yaml::Value>;

/// Backend persisting a [`RawState`].
pub trait StateStorage: Send + Sync {
    /// Read the whole state. A missing backing file is an empty state.
    fn read(&self) -> StateResult<RawState>;

    /// Replace the whole persisted state.
    fn write(&self, state: &RawState) -> StateResult<()>;
}

#[derive(Default)]
struct Inner {
    state: RawState,
    loaded: bool,
    changed: bool,
}

/// In-memory cache of the state file in front of a [`StateStorage`].
///
/// Internally synchronised; share it as `Arc<StateStore>`.
pub struct StateStore {
    storage: Box<dyn StateStorage>,
    inner: Mutex<Inner>,
}

impl StateStore {
    pub fn new(storage: impl StateStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Store backed by a YAML file at `path`.
    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        Self::new(YamlStorage::new(path))
    }

    /// Read the state from storage, discarding unsaved changes.
    pub fn load(&self) -> StateResult<()> {
        let mut inner = self.inner.lock();
        Self::load_locked(self.storage.as_ref(), &mut inner)
    }

    /// Persist the in-memory state.
    pub fn save(&self) -> StateResult<()> {
        let mut inner = self.inner.lock();
        self.storage.write(&inner.state)?;
        inner.changed = false;
        inner.loaded = true;
        debug!(entries = inner.state.len(), "state saved");
        Ok(())
    }

    pub fn loaded(&self) -> bool {
        self.inner.lock().loaded
    }

    /// Whether `set` was called since the last load or save.
    pub fn changed(&self) -> bool {
        self.inner.lock().changed
    }

    /// Decode the entry stored under `key`, loading the state on first use.
    ///
    /// An absent key yields `T::default()`.
    pub fn get<T>(&self, key: &str) -> StateResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let raw = {
            let mut inner = self.inner.lock();
            Self::ensure_loaded(self.storage.as_ref(), &mut inner)?;
            inner.state.get(key).cloned()
        };

        match raw {
            None | Some(serde_yaml::Value::Null) => Ok(T::default()),
            Some(value) => from_value_weak(value).map_err(|source| StateError::Decode {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Replace the entry stored under `key`.
    pub fn set<T: Serialize>(&self, key: &str, entry: T) -> StateResult<()> {
        let value = serde_yaml::to_value(&entry).map_err(|source| StateError::Encode {
            key: key.to_string(),
            source,
        })?;

        let mut inner = self.inner.lock();
        Self::ensure_loaded(self.storage.as_ref(), &mut inner)?;
        inner.state.insert(key.to_string(), value);
        inner.changed = true;
        Ok(())
    }

    fn ensure_loaded(storage: &dyn StateStorage, inner: &mut Inner) -> StateResult<()> {
        if inner.loaded {
            return Ok(());
        }
        Self::load_locked(storage, inner)
    }

    fn load_locked(storage: &dyn StateStorage, inner: &mut Inner) -> StateResult<()> {
        inner.state = storage.read()?;
        inner.changed = false;
        inner.loaded = true;
        Ok(())
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StateStore")
            .field("entries", &inner.state.len())
            .field("loaded", &inner.loaded)
            .field("changed", &inner.changed)
            .finish()
    }
}
