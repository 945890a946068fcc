use thiserror::Error;

pub type Result<T = (), E = RegistryError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{0} is not one of {valid}", valid = crate::domain::RootKey::names().join(", "))]
    InvalidRoot(String),

    #[error("Architecture must be '32', '64', or 'process', not {0}")]
    InvalidArchitecture(String),

    /// The architecture selector has no active view. Raised before any store
    /// call is made; indicates a caller bug, never retried.
    #[error("Invalid state. Exactly one of arch32, arch64 or arch_default must be active")]
    InvalidState,

    #[error("'{path}' has no value to get")]
    NoValue { path: String },

    #[error("Registry entry not found: {path}")]
    NotFound { path: String },

    #[error("The requested action on '{path}' requires write permissions to the registry")]
    PermissionDenied { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    #[must_use]
    pub const fn is_no_value(&self) -> bool {
        matches!(self, Self::NoValue { .. })
    }
}
