//! # State Store
//!
//! A process-wide key to record map persisted as a human-editable YAML file
//! (`~/.ddev/state.yml`). Periodic tasks keep their bookkeeping here, each
//! under its own key.
//!
//! Records are decoded leniently: a value written as `"3"` by hand still reads
//! into an integer field, `null` reads as the field default, and a missing key
//! yields `T::default()`.
//!
//! ```rust,ignore
//! let store = StateStore::yaml(paths.state_file());
//! let mut entry: RemoteConfigState = store.get("remote_config")?;
//! entry.last_ticker_message += 1;
//! store.set("remote_config", entry)?;
//! store.save()?;
//! ```

mod error;
mod store;
mod weak;
mod yaml;

pub use error::{StateError, StateResult};
pub use store::{RawState, StateStorage, StateStore};
pub use weak::from_value_weak;
pub use yaml::YamlStorage;
