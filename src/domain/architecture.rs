//! Architecture view selection.
//!
//! On 64-bit Windows the registry keeps separate subtrees for 32-bit and
//! 64-bit components. An accessor picks one of three views: whatever the
//! running process would see by default, or an explicit 32-bit or 64-bit
//! override applied through the access mask.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Registry access rights plus the WOW64 view override bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMask(pub u32);

impl AccessMask {
    pub const NONE: Self = Self(0);
    pub const KEY_READ: Self = Self(0x0002_0019);
    pub const KEY_ALL_ACCESS: Self = Self(0x000F_003F);
    pub const KEY_WOW64_64KEY: Self = Self(0x0100);
    pub const KEY_WOW64_32KEY: Self = Self(0x0200);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when the mask asks for more than read access.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.0 & !(Self::KEY_READ.0 | Self::KEY_WOW64_32KEY.0 | Self::KEY_WOW64_64KEY.0) != 0
    }

    #[must_use]
    pub const fn wow64_32(self) -> bool {
        self.contains(Self::KEY_WOW64_32KEY)
    }

    #[must_use]
    pub const fn wow64_64(self) -> bool {
        self.contains(Self::KEY_WOW64_64KEY)
    }
}

impl BitOr for AccessMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Requested view at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Architecture {
    #[default]
    Process,
    Bits32,
    Bits64,
}

impl Architecture {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Bits32 => "32",
            Self::Bits64 => "64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "process" {
            return Ok(Self::Process);
        }
        match s.trim().parse::<i64>() {
            Ok(32) => Ok(Self::Bits32),
            Ok(64) => Ok(Self::Bits64),
            _ => Err(RegistryError::InvalidArchitecture(s.to_string())),
        }
    }
}

impl TryFrom<u32> for Architecture {
    type Error = RegistryError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            other => Err(RegistryError::InvalidArchitecture(other.to_string())),
        }
    }
}

impl TryFrom<String> for Architecture {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Architecture> for String {
    fn from(arch: Architecture) -> Self {
        arch.as_str().to_string()
    }
}

/// Which view subsequent operations use.
///
/// At most one view is active. The setters behave like three independent
/// boolean flags: turning one on clears the others, while turning the active
/// one off leaves nothing selected (`Unset`) instead of falling back to
/// `Default`. Reading the effective flag while `Unset` is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchSelector {
    #[default]
    Default,
    Arch32,
    Arch64,
    Unset,
}

impl ArchSelector {
    #[must_use]
    pub const fn arch32(&self) -> bool {
        matches!(self, Self::Arch32)
    }

    #[must_use]
    pub const fn arch64(&self) -> bool {
        matches!(self, Self::Arch64)
    }

    #[must_use]
    pub const fn arch_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn set_arch32(&mut self, value: bool) {
        self.toggle(Self::Arch32, value);
    }

    pub fn set_arch64(&mut self, value: bool) {
        self.toggle(Self::Arch64, value);
    }

    pub fn set_arch_default(&mut self, value: bool) {
        self.toggle(Self::Default, value);
    }

    fn toggle(&mut self, target: Self, value: bool) {
        if value {
            *self = target;
        } else if *self == target {
            *self = Self::Unset;
        }
    }

    /// View override bits to OR into an access mask.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidState`] when no view is selected.
    pub fn flag(&self) -> Result<AccessMask> {
        match self {
            Self::Default => Ok(AccessMask::NONE),
            Self::Arch32 => Ok(AccessMask::KEY_WOW64_32KEY),
            Self::Arch64 => Ok(AccessMask::KEY_WOW64_64KEY),
            Self::Unset => Err(RegistryError::InvalidState),
        }
    }
}

impl From<Architecture> for ArchSelector {
    fn from(arch: Architecture) -> Self {
        match arch {
            Architecture::Process => Self::Default,
            Architecture::Bits32 => Self::Arch32,
            Architecture::Bits64 => Self::Arch64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(sel: ArchSelector) -> usize {
        [sel.arch_default(), sel.arch32(), sel.arch64()]
            .iter()
            .filter(|b| **b)
            .count()
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!("process".parse::<Architecture>().unwrap(), Architecture::Process);
        assert_eq!("32".parse::<Architecture>().unwrap(), Architecture::Bits32);
        assert_eq!(" 64 ".parse::<Architecture>().unwrap(), Architecture::Bits64);
        assert_eq!(Architecture::try_from(64).unwrap(), Architecture::Bits64);
    }

    #[test]
    fn test_parse_rejects_other_tokens() {
        for bad in ["16", "Process", "x86", "", "32.5", "128"] {
            assert!(matches!(
                bad.parse::<Architecture>(),
                Err(RegistryError::InvalidArchitecture(_))
            ));
        }
        assert!(Architecture::try_from(16).is_err());
    }

    #[test]
    fn test_setting_one_view_clears_the_others() {
        let mut sel = ArchSelector::default();
        assert!(sel.arch_default());

        sel.set_arch32(true);
        sel.set_arch64(true);
        assert!(!sel.arch32());
        assert!(sel.arch64());
        assert_eq!(active(sel), 1);

        sel.set_arch_default(true);
        assert!(sel.arch_default());
        assert_eq!(active(sel), 1);
    }

    #[test]
    fn test_clearing_active_view_leaves_none_selected() {
        let mut sel = ArchSelector::default();
        sel.set_arch32(true);
        sel.set_arch32(false);
        assert_eq!(sel, ArchSelector::Unset);
        assert_eq!(active(sel), 0);
        assert!(matches!(sel.flag(), Err(RegistryError::InvalidState)));

        let mut sel = ArchSelector::default();
        sel.set_arch_default(false);
        assert_eq!(active(sel), 0);
    }

    #[test]
    fn test_clearing_inactive_view_is_a_no_op() {
        let mut sel = ArchSelector::Arch64;
        sel.set_arch32(false);
        sel.set_arch_default(false);
        assert!(sel.arch64());
    }

    #[test]
    fn test_effective_flags() {
        assert_eq!(ArchSelector::Default.flag().unwrap(), AccessMask::NONE);
        assert_eq!(ArchSelector::Arch32.flag().unwrap().bits(), 0x0200);
        assert_eq!(ArchSelector::Arch64.flag().unwrap().bits(), 0x0100);
    }

    #[test]
    fn test_access_mask_writability() {
        assert!(!AccessMask::KEY_READ.is_writable());
        assert!(!(AccessMask::KEY_READ | AccessMask::KEY_WOW64_32KEY).is_writable());
        assert!(AccessMask::KEY_ALL_ACCESS.is_writable());
        assert!((AccessMask::KEY_ALL_ACCESS | AccessMask::KEY_WOW64_64KEY).wow64_64());
    }
}
