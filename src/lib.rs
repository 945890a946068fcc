pub mod accessor;
pub mod domain;
pub mod error;
pub mod repositories;
pub mod utils;

// Public, stable-ish API surface for consumers

pub use crate::accessor::RegistryAccessor;

pub use crate::domain::{AccessMask, ArchSelector, Architecture, RootKey, Value, ValueType};

pub use crate::error::{RegistryError, Result};

pub use crate::repositories::{MemoryStore, RegistryStore};

#[cfg(windows)]
pub use crate::repositories::WinRegStore;

pub use crate::utils::{is_os_64bit, is_process_64bit};

pub mod prelude {
    pub use crate::accessor::RegistryAccessor;
    pub use crate::domain::{Architecture, RootKey, Value, ValueType};
    pub use crate::error::{RegistryError, Result};
    pub use crate::repositories::{MemoryStore, RegistryStore};
    pub use crate::utils::{is_os_64bit, is_process_64bit};
}
