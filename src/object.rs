//! Persistent-object singletons: configuration/data objects without a host
//! object lifecycle, resolved lazily and cached.

use std::sync::Arc;

use log::{info, warn};

use crate::{ObjectEntry, ObjectSource, RegistryOptions, ResourceLoader, TypeKey};

/// A lazily resolved configuration/data singleton.
///
/// Resolution order (first success wins and is cached by the registry):
/// the configured object list, then the resource system under
/// [`resource_name`](SingletonObject::resource_name), then, with the tooling
/// capability only, a freshly created and persisted `Default` value.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::SingletonObject;
///
/// #[derive(Default)]
/// struct GameSettings {
///     difficulty: u8,
/// }
///
/// impl SingletonObject for GameSettings {}
///
/// assert_eq!(GameSettings::resource_name(), "GameSettings");
/// ```
pub trait SingletonObject: Default + Send + Sync + 'static {
    /// Conventional resource name; the short type name unless overridden.
    fn resource_name() -> String {
        TypeKey::of::<Self>().short_name().to_string()
    }
}

/// Runs resolution steps 2-4 (the cache is the caller's business).
pub(crate) fn resolve<T: SingletonObject>(
    configured: &[Option<ObjectEntry>],
    resources: &dyn ResourceLoader,
    options: &RegistryOptions,
) -> Option<(Arc<T>, ObjectSource)> {
    let key = TypeKey::of::<T>();

    if let Some(found) = configured
        .iter()
        .flatten()
        .filter(|entry| entry.key() == key)
        .find_map(ObjectEntry::downcast::<T>)
    {
        return Some((found, ObjectSource::Configured));
    }

    let name = T::resource_name();
    if let Some(asset) = resources.load_named(&name) {
        match asset.downcast::<T>() {
            Ok(found) => return Some((found, ObjectSource::Resources)),
            Err(_) => warn!("Resource '{}' is not a {}; ignoring it", name, key.type_name()),
        }
    }

    if !options.tooling {
        return None;
    }

    let created = Arc::new(T::default());
    let path = options.asset_path(&name);
    match resources.persist_new(&path, created.clone()) {
        Ok(()) => info!("Created {} at {}", key, path),
        Err(err) => warn!("Created {} but could not persist it: {}", key, err),
    }

    Some((created, ObjectSource::Created))
}
