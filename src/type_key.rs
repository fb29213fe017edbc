//! Type identity used as the key of every singleton table.

use std::any::TypeId;
use std::fmt;

/// A `TypeId` paired with the type's name, so tables can be keyed by type while
/// still producing readable log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name (e.g. `my_game::audio::AudioManager`).
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Type name without module path or generic arguments (e.g. `AudioManager`).
    ///
    /// This is the conventional name for resources and ad-hoc host objects.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
