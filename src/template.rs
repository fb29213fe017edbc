//! Singleton templates: the unspawned, configured entries.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::facet::{Facet, SingletonBehaviour};
use crate::host::ObjectHook;
use crate::TypeKey;

struct Prototype {
    facet: Arc<Facet>,
    make: Arc<dyn Fn() -> Facet + Send + Sync>,
}

/// A prefab-like description of a host object carrying singleton facets.
///
/// Templates are shared as `Arc<Template>`; two entries are the same entry only
/// if they are the same `Arc`. Each spawn copies every prototype into a fresh
/// facet on a fresh host object.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{SingletonBehaviour, Template};
///
/// #[derive(Default, Clone)]
/// struct Logger;
/// impl SingletonBehaviour for Logger {}
///
/// let template = Template::new("Logger").with(Logger).disabled();
/// assert!(!template.is_enabled());
/// assert!(template.is_singleton());
/// ```
pub struct Template {
    name: String,
    enabled: AtomicBool,
    prototypes: Vec<Prototype>,
    hooks: Vec<Arc<dyn ObjectHook>>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: AtomicBool::new(true),
            prototypes: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Adds a singleton component; each spawned copy gets a clone of `prototype`.
    pub fn with<T: SingletonBehaviour + Clone>(mut self, prototype: T) -> Self {
        let prototype = Arc::new(prototype);
        let source = prototype.clone();
        self.prototypes.push(Prototype {
            facet: Arc::new(Facet::from_arc(prototype)),
            make: Arc::new(move || Facet::new((*source).clone())),
        });
        self
    }

    /// Adds a plain hook shared by every spawned copy.
    pub fn with_hook(mut self, hook: Arc<dyn ObjectHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Marks the template disabled at configuration time.
    pub fn disabled(self) -> Self {
        self.set_enabled(false);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether the template carries at least one singleton facet.
    pub fn is_singleton(&self) -> bool {
        !self.prototypes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.prototypes.iter().map(|p| p.facet.key())
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.keys().any(|k| k == key)
    }

    /// The unbound prototype facet of the given type.
    pub fn prototype(&self, key: TypeKey) -> Option<Arc<Facet>> {
        self.prototypes
            .iter()
            .find(|p| p.facet.key() == key)
            .map(|p| p.facet.clone())
    }

    pub(crate) fn copy_facets(&self) -> Vec<Arc<Facet>> {
        self.prototypes.iter().map(|p| Arc::new((p.make)())).collect()
    }

    pub(crate) fn hooks(&self) -> &[Arc<dyn ObjectHook>] {
        &self.hooks
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("types", &self.keys().map(|k| k.short_name()).collect::<Vec<_>>())
            .finish()
    }
}
