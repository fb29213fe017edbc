use std::fmt;

/// Errors raised at the resource seam.
///
/// Core registry operations never fail; they degrade to a logged warning plus a
/// fallback. These errors only surface from [`crate::ResourceLoader`]
/// implementations and typed downcasts.
#[derive(Debug, Clone, PartialEq)]
pub enum SingletonError {
    /// A stored value was not of the requested type.
    TypeMismatch { type_name: &'static str },
    /// The resource location does not accept new assets.
    ReadOnly { path: String },
    /// Persisting a new asset failed.
    PersistFailed { path: String, reason: String },
}

impl fmt::Display for SingletonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonError::TypeMismatch { type_name } => {
                write!(f, "Type mismatch for singleton: {}", type_name)
            }
            SingletonError::ReadOnly { path } => {
                write!(f, "Resource location is read-only: {}", path)
            }
            SingletonError::PersistFailed { path, reason } => {
                write!(f, "Failed to persist asset at {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for SingletonError {}
