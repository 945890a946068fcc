//! Live Windows registry backend - thin wrapper over winreg.

use super::{RegistryStore, ValueIter};
use crate::domain::{value, AccessMask, RootKey, Value, ValueType};
use std::io;
use tracing::trace;
use winreg::enums::RegDisposition;
use winreg::RegKey;

/// The system registry. Handles are `winreg::RegKey`s, closed on drop.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinRegStore;

impl WinRegStore {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn decode_raw(raw: &winreg::RegValue) -> (Value, ValueType) {
    let vtype = ValueType::from_code(raw.vtype.clone() as u32);
    let bytes: &[u8] = &raw.bytes;
    (value::decode(bytes, vtype), vtype)
}

impl RegistryStore for WinRegStore {
    type Key = RegKey;

    fn open_key(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<RegKey> {
        RegKey::predef(root.hkey()).open_subkey_with_flags(path, access.bits())
    }

    fn create_key(&self, root: RootKey, path: &str, access: AccessMask) -> io::Result<RegKey> {
        let (key, disposition) =
            RegKey::predef(root.hkey()).create_subkey_with_flags(path, access.bits())?;
        let created = matches!(disposition, RegDisposition::REG_CREATED_NEW_KEY);
        trace!(%root, path, created, "create_subkey");
        Ok(key)
    }

    fn value_count(&self, key: &RegKey) -> io::Result<usize> {
        let info = key.query_info()?;
        Ok(usize::try_from(info.values).unwrap_or(usize::MAX))
    }

    fn query_value(&self, key: &RegKey, name: &str) -> io::Result<(Value, ValueType)> {
        let raw = key.get_raw_value(name)?;
        Ok(decode_raw(&raw))
    }

    fn values<'k>(&'k self, key: &'k RegKey) -> ValueIter<'k> {
        Box::new(
            key.enum_values()
                .map(|entry| entry.map(|(name, raw)| (name, decode_raw(&raw).0))),
        )
    }

    fn set_string(&self, key: &RegKey, name: &str, data: &str) -> io::Result<()> {
        key.set_value(name, &data)
    }
}
