use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Narrow interface to persistent key-value storage for numeric settings.
///
/// Values are opaque 64-bit patterns; floating-point settings go through
/// `f64::to_bits`/`from_bits` at the call site. A missing key is `None`, and
/// callers supply their own defaults.
pub trait NumericStore {
    /// Looks up the stored pattern for `key`.
    fn get_numeric(&self, key: &str) -> Option<u64>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    /// Returns an I/O error if the value could not be persisted. Callers treat
    /// this as non-fatal and keep their in-memory state.
    fn set_numeric(&mut self, key: &str, value: u64) -> io::Result<()>;
}

/// In-memory store; clones share the same backing map.
///
/// Mainly for tests, where two evaluator instances need to observe the same
/// "flash" contents.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, u64>>>,
}

impl NumericStore for MemoryStore {
    fn get_numeric(&self, key: &str) -> Option<u64> {
        self.values.lock().unwrap().get(key).copied()
    }

    fn set_numeric(&mut self, key: &str, value: u64) -> io::Result<()> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// TOML-file-backed store.
///
/// The whole map is loaded at open and rewritten on every update; a missing
/// file is an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, u64>,
}

impl FileStore {
    /// Opens the store at `path`, creating an empty one if the file is absent.
    ///
    /// # Errors
    /// Returns an I/O error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(io::Error::other)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err),
        };
        Ok(Self { path, values })
    }
}

impl NumericStore for FileStore {
    fn get_numeric(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }

    fn set_numeric(&mut self, key: &str, value: u64) -> io::Result<()> {
        self.values.insert(key.to_string(), value);
        let rendered = toml::to_string(&self.values).map_err(io::Error::other)?;
        std::fs::write(&self.path, rendered)
    }
}
