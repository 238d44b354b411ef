//! Durable whole-file storage of one typed record.
//!
//! File layout:
//!
//! ```text
//! +------+---------+------------------+---------------------------+
//! | DDVC | version | payload len (BE) | MessagePack, named fields |
//! | 4 B  | 1 B     | 4 B              | len B                     |
//! +------+---------+------------------+---------------------------+
//! ```
//!
//! Fields are encoded by name, so records marked `#[serde(default)]` read old
//! files with new fields set to their defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const MAGIC: &[u8; 4] = b"DDVC";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 4;
const FILE_MODE: u32 = 0o644;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header or length framing is wrong, e.g. a truncated file.
    #[error("corrupt cache file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to decode cache file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rmp_serde::decode::Error,
    },

    #[error("failed to encode cache record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Read-once, write-through cache of a single `T` stored at `path`.
#[derive(Debug)]
pub struct FileCache<T> {
    path: PathBuf,
    value: Option<T>,
    _record: PhantomData<fn() -> T>,
}

impl<T> FileCache<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            value: None,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file has been read (or written) by this instance.
    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// Return the cached record, reading the file on first call only.
    ///
    /// A missing file yields `T::default()`. A file that fails to decode
    /// returns the error once; the cache then holds `T::default()` so the
    /// owner can carry on with an empty record.
    pub fn read(&mut self) -> CacheResult<T> {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }

        match self.read_file() {
            Ok(value) => {
                self.value = Some(value.clone());
                Ok(value)
            }
            Err(e) => {
                self.value = Some(T::default());
                Err(e)
            }
        }
    }

    /// Replace the file with `record` and remember it in memory.
    pub fn write(&mut self, record: &T) -> CacheResult<()> {
        let bytes = encode(record)?;
        ddev_config_and_utils::fs::atomic_write(&self.path, &bytes, FILE_MODE)?;
        self.value = Some(record.clone());
        debug!(path = %self.path.display(), bytes = bytes.len(), "cache written");
        Ok(())
    }

    /// Delete the file and reset the in-memory record.
    pub fn remove(&mut self) -> CacheResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.value = Some(T::default());
        Ok(())
    }

    fn read_file(&self) -> CacheResult<T> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cache file yet");
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };

        let payload = self.unframe(&data)?;
        rmp_serde::from_slice(payload).map_err(|source| CacheError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn unframe<'a>(&self, data: &'a [u8]) -> CacheResult<&'a [u8]> {
        let corrupt = |reason: String| CacheError::Corrupt {
            path: self.path.clone(),
            reason,
        };

        if data.len() < HEADER_LEN {
            return Err(corrupt(format!("file too short ({} bytes)", data.len())));
        }
        if &data[..4] != MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }
        if data[4] != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", data[4])));
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[5..HEADER_LEN]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        let payload = &data[HEADER_LEN..];
        if payload.len() != len {
            return Err(corrupt(format!(
                "payload length {} does not match header {}",
                payload.len(),
                len
            )));
        }
        Ok(payload)
    }
}

fn encode<T: Serialize>(record: &T) -> CacheResult<Vec<u8>> {
    let payload = rmp_serde::to_vec_named(record)?;
    let len = u32::try_from(payload.len()).map_err(|_| {
        CacheError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "cache record larger than 4 GiB",
        ))
    })?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}
