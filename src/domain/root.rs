//! Reserved registry roots.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the predefined top-level keys exposed by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RootKey {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    PerformanceData,
    CurrentConfig,
    DynData,
}

impl RootKey {
    pub const PREFIX: &'static str = "HKEY_";

    pub const ALL: [Self; 7] = [
        Self::ClassesRoot,
        Self::CurrentUser,
        Self::LocalMachine,
        Self::Users,
        Self::PerformanceData,
        Self::CurrentConfig,
        Self::DynData,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClassesRoot => "HKEY_CLASSES_ROOT",
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
            Self::Users => "HKEY_USERS",
            Self::PerformanceData => "HKEY_PERFORMANCE_DATA",
            Self::CurrentConfig => "HKEY_CURRENT_CONFIG",
            Self::DynData => "HKEY_DYN_DATA",
        }
    }

    /// Identifiers of every valid root, in declaration order.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }

    /// Predefined handle for this root.
    #[cfg(windows)]
    #[must_use]
    pub const fn hkey(&self) -> winreg::HKEY {
        use winreg::enums::*;
        match self {
            Self::ClassesRoot => HKEY_CLASSES_ROOT,
            Self::CurrentUser => HKEY_CURRENT_USER,
            Self::LocalMachine => HKEY_LOCAL_MACHINE,
            Self::Users => HKEY_USERS,
            Self::PerformanceData => HKEY_PERFORMANCE_DATA,
            Self::CurrentConfig => HKEY_CURRENT_CONFIG,
            Self::DynData => HKEY_DYN_DATA,
        }
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RootKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with(Self::PREFIX) {
            return Err(RegistryError::InvalidRoot(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|root| root.as_str() == s)
            .ok_or_else(|| RegistryError::InvalidRoot(s.to_string()))
    }
}

impl TryFrom<String> for RootKey {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RootKey> for String {
    fn from(root: RootKey) -> Self {
        root.as_str().to_string()
    }
}
