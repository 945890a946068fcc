//! In-process registry store.
//!
//! Mirrors the parts of the Windows registry the accessor relies on: a tree
//! of case-insensitive keys per root, separate 32-bit and 64-bit views chosen
//! by the WOW64 bits of the access mask, and access checks on writes.

use super::{RegistryStore, ValueIter};
use crate::domain::{AccessMask, RootKey, Value, ValueType};
use crate::utils;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum View {
    Bits32,
    Bits64,
}

impl View {
    fn from_mask(access: AccessMask) -> Self {
        if access.wow64_32() {
            Self::Bits32
        } else if access.wow64_64() || utils::is_process_64bit() {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    name: String,
    value: Value,
    vtype: ValueType,
}

#[derive(Debug, Default)]
struct Node {
    values: BTreeMap<String, StoredValue>,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn find(&self, segments: &[String]) -> Option<&Self> {
        segments
            .iter()
            .try_fold(self, |node, seg| node.children.get(seg))
    }

    fn find_mut(&mut self, segments: &[String]) -> Option<&mut Self> {
        segments
            .iter()
            .try_fold(self, |node, seg| node.children.get_mut(seg))
    }

    fn find_or_create(&mut self, segments: &[String]) -> &mut Self {
        segments.iter().fold(self, |node, seg| {
            node.children.entry(seg.clone()).or_default()
        })
    }
}

static EMPTY_ROOT: Node = Node {
    values: BTreeMap::new(),
    children: BTreeMap::new(),
};

#[derive(Debug, Default)]
struct State {
    trees: HashMap<(View, RootKey), Node>,
    write_protected: HashSet<RootKey>,
}

impl State {
    /// Roots always exist, even before anything was written under them.
    fn lookup(&self, view: View, root: RootKey, segments: &[String]) -> Option<&Node> {
        match self.trees.get(&(view, root)) {
            Some(tree) => tree.find(segments),
            None if segments.is_empty() => Some(&EMPTY_ROOT),
            None => None,
        }
    }
}

/// Handle to a key in a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryKey {
    view: View,
    root: RootKey,
    path: String,
    segments: Vec<String>,
    writable: bool,
}

impl MemoryKey {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn root(&self) -> RootKey {
        self.root
    }
}

/// Registry store held entirely in memory. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

fn segments(path: &str) -> Vec<String> {
    path.split('\\')
        .filter(|seg| !seg.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn not_found(what: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{what} not found"))
}

fn access_denied(what: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, format!("access to {what} denied"))
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("memory registry lock poisoned"))
    }

    /// Refuse every writable open under `root`, like a hive the caller has no
    /// write rights to.
    pub fn deny_writes(&self, root: RootKey) -> io::Result<()> {
        self.lock()?.write_protected.insert(root);
        Ok(())
    }

    /// Store a value of any type directly, creating the key if needed. The
    /// view is picked from the WOW64 bits of `access`.
    pub fn insert_value(
        &self,
        root: RootKey,
        access: AccessMask,
        path: &str,
        name: &str,
        value: Value,
    ) -> io::Result<()> {
        let mut state = self.lock()?;
        let node = state
            .trees
            .entry((View::from_mask(access), root))
            .or_default()
            .find_or_create(&segments(path));
        let vtype = value.natural_type();
        node.values.insert(
            name.to_lowercase(),
            StoredValue {
                name: name.to_string(),
                value,
                vtype,
            },
        );
        Ok(())
    }

    fn handle(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<MemoryKey> {
        let writable = access.is_writable();
        if writable && self.lock()?.write_protected.contains(&root) {
            return Err(access_denied(format_args!("{root}\\{path}")));
        }
        Ok(MemoryKey {
            view: View::from_mask(access),
            root,
            path: path.to_string(),
            segments: segments(path),
            writable,
        })
    }

    fn with_node<R>(
        &self,
        key: &MemoryKey,
        f: impl FnOnce(&Node) -> io::Result<R>,
    ) -> io::Result<R> {
        let state = self.lock()?;
        let node = state
            .lookup(key.view, key.root, &key.segments)
            .ok_or_else(|| not_found(format_args!("{}\\{}", key.root, key.path)))?;
        f(node)
    }
}

impl RegistryStore for MemoryStore {
    type Key = MemoryKey;

    fn open_key(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<MemoryKey> {
        let key = self.handle(root, path, access)?;
        let exists = self
            .lock()?
            .lookup(key.view, root, &key.segments)
            .is_some();
        if exists {
            Ok(key)
        } else {
            Err(not_found(format_args!("{root}\\{path}")))
        }
    }

    fn create_key(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<MemoryKey> {
        let key = self.handle(root, path, access)?;
        self.lock()?
            .trees
            .entry((key.view, root))
            .or_default()
            .find_or_create(&key.segments);
        trace!(%root, path, view = ?key.view, "memory create_key");
        Ok(key)
    }

    fn value_count(&self, key: &MemoryKey) -> io::Result<usize> {
        self.with_node(key, |node| Ok(node.values.len()))
    }

    fn query_value(&self, key: &MemoryKey, name: &str) -> io::Result<(Value, ValueType)> {
        self.with_node(key, |node| {
            node.values
                .get(&name.to_lowercase())
                .map(|stored| (stored.value.clone(), stored.vtype))
                .ok_or_else(|| not_found(format_args!("value '{name}'")))
        })
    }

    fn values<'k>(&'k self, key: &'k MemoryKey) -> ValueIter<'k> {
        let snapshot = self.with_node(key, |node| {
            Ok(node
                .values
                .values()
                .map(|stored| (stored.name.clone(), stored.value.clone()))
                .collect::<Vec<_>>())
        });
        match snapshot {
            Ok(entries) => Box::new(entries.into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn set_string(&self, key: &MemoryKey, name: &str, data: &str) -> io::Result<()> {
        if !key.writable {
            return Err(access_denied(format_args!("{}\\{}", key.root, key.path)));
        }
        let mut state = self.lock()?;
        let node = state
            .trees
            .entry((key.view, key.root))
            .or_default()
            .find_mut(&key.segments)
            .ok_or_else(|| not_found(format_args!("{}\\{}", key.root, key.path)))?;
        node.values.insert(
            name.to_lowercase(),
            StoredValue {
                name: name.to_string(),
                value: Value::String(data.to_string()),
                vtype: ValueType::String,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READ: AccessMask = AccessMask::KEY_READ;
    const WRITE: AccessMask = AccessMask::KEY_ALL_ACCESS;

    #[test]
    fn test_open_missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .open_key(RootKey::CurrentUser, r"Software\Missing", READ)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_create_key_builds_parents() {
        let store = MemoryStore::new();
        let created = store
            .create_key(RootKey::CurrentUser, r"Software\Acme\Tool", WRITE)
            .unwrap();
        assert_eq!(created.root(), RootKey::CurrentUser);
        assert_eq!(created.path(), r"Software\Acme\Tool");
        assert!(store.open_key(RootKey::CurrentUser, "Software", READ).is_ok());
        assert!(store
            .open_key(RootKey::CurrentUser, r"SOFTWARE\acme\TOOL\", READ)
            .is_ok());
        assert!(store.open_key(RootKey::LocalMachine, "Software", READ).is_err());
    }

    #[test]
    fn test_views_are_separate() {
        let store = MemoryStore::new();
        let wow32 = WRITE | AccessMask::KEY_WOW64_32KEY;
        store.create_key(RootKey::LocalMachine, "Software\\Only32", wow32).unwrap();

        assert!(store
            .open_key(RootKey::LocalMachine, "Software\\Only32", READ | AccessMask::KEY_WOW64_32KEY)
            .is_ok());
        assert!(store
            .open_key(RootKey::LocalMachine, "Software\\Only32", READ | AccessMask::KEY_WOW64_64KEY)
            .is_err());
    }

    #[test]
    fn test_value_names_are_case_insensitive() {
        let store = MemoryStore::new();
        let key = store.create_key(RootKey::CurrentUser, "App", WRITE).unwrap();
        store.set_string(&key, "Theme", "dark").unwrap();
        store.set_string(&key, "THEME", "light").unwrap();

        assert_eq!(store.value_count(&key).unwrap(), 1);
        let (value, vtype) = store.query_value(&key, "theme").unwrap();
        assert_eq!(value, Value::from("light"));
        assert_eq!(vtype, ValueType::String);

        let names: Vec<_> = store.values(&key).map(|e| e.unwrap().0).collect();
        assert_eq!(names, vec!["THEME".to_string()]);
    }

    #[test]
    fn test_write_protection() {
        let store = MemoryStore::new();
        store.deny_writes(RootKey::LocalMachine).unwrap();
        let err = store
            .create_key(RootKey::LocalMachine, "Software", WRITE)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        let key = store.create_key(RootKey::CurrentUser, "App", WRITE).unwrap();
        let read_only = store.open_key(RootKey::CurrentUser, "App", READ).unwrap();
        assert!(store.set_string(&key, "a", "1").is_ok());
        assert_eq!(
            store.set_string(&read_only, "a", "2").unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_insert_value_keeps_type() {
        let store = MemoryStore::new();
        store
            .insert_value(RootKey::CurrentUser, READ, "App", "Count", Value::Dword(3))
            .unwrap();
        let key = store.open_key(RootKey::CurrentUser, "App", READ).unwrap();
        assert_eq!(
            store.query_value(&key, "count").unwrap(),
            (Value::Dword(3), ValueType::Dword)
        );
    }

    #[test]
    fn test_clones_share_contents() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.create_key(RootKey::Users, "S-1-5-18", WRITE).unwrap();
        assert!(other.open_key(RootKey::Users, "S-1-5-18", READ).is_ok());
    }
}
