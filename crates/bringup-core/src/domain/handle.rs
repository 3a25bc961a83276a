//! Identity handles assigned by the target environment.

use serde::{Deserialize, Serialize};

/// Returned when an identity handle would be empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identity handle must not be empty")]
pub struct EmptyHandleError;

/// Opaque address of a created component instance.
///
/// Never empty; the target environment decides the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityHandle(String);

impl IdentityHandle {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyHandleError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(EmptyHandleError);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdentityHandle {
    type Error = EmptyHandleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityHandle> for String {
    fn from(handle: IdentityHandle) -> Self {
        handle.0
    }
}

impl std::fmt::Display for IdentityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
