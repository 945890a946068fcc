//! Typed access to one registry root through a selectable architecture view.

use crate::domain::{AccessMask, ArchSelector, Architecture, RootKey, Value, ValueType};
use crate::error::{RegistryError, Result};
use crate::repositories::RegistryStore;
use std::collections::HashMap;
use std::io;
use tracing::{debug, trace};

/// Reads, enumerates and writes values below a single root.
///
/// The accessor holds no open handles between calls: every operation opens
/// its key, uses it, and releases it before returning, on success and on
/// error alike.
///
/// ## Thread Safety
///
/// The view selector is plain mutable state. Sharing one accessor between
/// threads that change the view needs external synchronization, e.g. a
/// `Mutex`.
#[derive(Debug, Clone)]
pub struct RegistryAccessor<S: RegistryStore> {
    store: S,
    root: RootKey,
    selector: ArchSelector,
}

#[cfg(windows)]
impl RegistryAccessor<crate::repositories::WinRegStore> {
    /// Accessor over the live system registry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchitecture` or `InvalidRoot` for unrecognised tokens.
    pub fn new(root: &str, architecture: &str) -> Result<Self> {
        Self::with_store(crate::repositories::WinRegStore::new(), root, architecture)
    }
}

impl<S: RegistryStore> RegistryAccessor<S> {
    /// Accessor over an arbitrary store.
    ///
    /// `architecture` is `"process"`, `"32"` or `"64"`. The architecture is
    /// validated before the root.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchitecture` or `InvalidRoot` for unrecognised tokens.
    pub fn with_store(store: S, root: &str, architecture: &str) -> Result<Self> {
        let architecture: Architecture = architecture.parse()?;
        let root: RootKey = root.parse()?;
        Ok(Self::from_parts(store, root, architecture))
    }

    #[must_use]
    pub fn from_parts(store: S, root: RootKey, architecture: Architecture) -> Self {
        Self {
            store,
            root,
            selector: architecture.into(),
        }
    }

    #[must_use]
    pub const fn root(&self) -> RootKey {
        self.root
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn selector(&self) -> ArchSelector {
        self.selector
    }

    #[must_use]
    pub const fn arch32(&self) -> bool {
        self.selector.arch32()
    }

    pub fn set_arch32(&mut self, value: bool) {
        self.selector.set_arch32(value);
    }

    #[must_use]
    pub const fn arch64(&self) -> bool {
        self.selector.arch64()
    }

    pub fn set_arch64(&mut self, value: bool) {
        self.selector.set_arch64(value);
    }

    #[must_use]
    pub const fn arch_default(&self) -> bool {
        self.selector.arch_default()
    }

    pub fn set_arch_default(&mut self, value: bool) {
        self.selector.set_arch_default(value);
    }

    /// Check whether `path` can be opened for reading.
    ///
    /// # Errors
    ///
    /// Any failure other than the key being absent is returned as-is.
    pub fn key_exists(&self, path: &str) -> Result<bool> {
        match self.readable_key(path) {
            Ok(_key) => Ok(true),
            Err(RegistryError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read one named value and the type tag the store reports for it.
    ///
    /// # Errors
    ///
    /// Returns `NoValue` if the key holds no values at all and `NotFound` if
    /// the key or the named value is missing.
    pub fn get_key_value(&self, path: &str, value_name: &str) -> Result<(Value, ValueType)> {
        let key = self.readable_key(path)?;
        let count = self
            .store
            .value_count(&key)
            .map_err(|e| self.translate(path, e))?;
        if count == 0 {
            return Err(RegistryError::NoValue {
                path: self.full_path(path),
            });
        }
        self.store
            .query_value(&key, value_name)
            .map_err(|e| self.translate(&format!("{path}\\{value_name}"), e))
    }

    /// Collect every value under `path` by name.
    ///
    /// # Errors
    ///
    /// Returns the first enumeration failure; end of data is not a failure.
    pub fn get_values(&self, path: &str) -> Result<HashMap<String, Value>> {
        let key = self.readable_key(path)?;
        let mut values = HashMap::new();
        for entry in self.store.values(&key) {
            let (name, value) = entry.map_err(|e| self.translate(path, e))?;
            values.insert(name, value);
        }
        trace!(root = %self.root, path, count = values.len(), "enumerated values");
        Ok(values)
    }

    /// Write `value` as a string value named `value_name`.
    ///
    /// With `create`, `path` and any missing parents are created first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `path` is missing and `create` is false, and
    /// `PermissionDenied` if the store refuses write access.
    pub fn set_value(&self, path: &str, value_name: &str, value: &str, create: bool) -> Result {
        let key = self.writable_key(path, create)?;
        self.store
            .set_string(&key, value_name, value)
            .map_err(|e| self.translate(path, e))
    }

    fn readable_key(&self, path: &str) -> Result<S::Key> {
        self.key(path, false, false)
    }

    fn writable_key(&self, path: &str, create: bool) -> Result<S::Key> {
        self.key(path, create, true)
    }

    fn key(&self, path: &str, create: bool, writable: bool) -> Result<S::Key> {
        let access = if writable {
            AccessMask::KEY_ALL_ACCESS
        } else {
            AccessMask::KEY_READ
        };
        let access = access | self.selector.flag()?;
        debug!(root = %self.root, path, %access, create, "opening key");

        let key = if create {
            self.store.create_key(self.root, path, access)
        } else {
            self.store.open_key(self.root, path, access)
        };
        key.map_err(|e| self.translate(path, e))
    }

    fn full_path(&self, path: &str) -> String {
        if path.is_empty() {
            self.root.to_string()
        } else {
            format!("{}\\{}", self.root, path)
        }
    }

    fn translate(&self, path: &str, err: io::Error) -> RegistryError {
        match err.kind() {
            io::ErrorKind::NotFound => RegistryError::NotFound {
                path: self.full_path(path),
            },
            io::ErrorKind::PermissionDenied => RegistryError::PermissionDenied {
                path: self.full_path(path),
            },
            _ => RegistryError::Io(err),
        }
    }
}
