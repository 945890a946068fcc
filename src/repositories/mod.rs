//! Backends for the registry store.
//!
//! The accessor only talks to the store through [`RegistryStore`]. The live
//! Windows registry is one implementation; [`MemoryStore`] is another that
//! runs anywhere and is what the test suite uses.

pub mod memory;
#[cfg(windows)]
pub mod registry;

pub use memory::MemoryStore;
#[cfg(windows)]
pub use registry::WinRegStore;

use crate::domain::{AccessMask, RootKey, Value, ValueType};
use std::io;

/// Value enumeration, yielded in store index order starting at 0.
///
/// The iterator ends when the store reports no more entries. Any other
/// failure is yielded as an `Err` item.
pub type ValueIter<'k> = Box<dyn Iterator<Item = io::Result<(String, Value)>> + 'k>;

/// Primitive operations of a hierarchical registry store.
///
/// Key handles are released when dropped. Failures use
/// [`io::ErrorKind::NotFound`] for a missing key or value and
/// [`io::ErrorKind::PermissionDenied`] for a refused access mode.
pub trait RegistryStore {
    type Key;

    fn open_key(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<Self::Key>;

    /// Open `path`, creating it and any missing parents first.
    fn create_key(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<Self::Key>;

    /// Number of named values recorded directly under the key.
    fn value_count(&self, key: &Self::Key) -> io::Result<usize>;

    fn query_value(&self, key: &Self::Key, name: &str) -> io::Result<(Value, ValueType)>;

    fn values<'k>(&'k self, key: &'k Self::Key) -> ValueIter<'k>;

    /// Write `data` as a plain string value.
    fn set_string(&self, key: &Self::Key, name: &str, data: &str) -> io::Result<()>;
}
