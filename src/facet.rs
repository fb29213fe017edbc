//! Behavioural singleton facets.
//!
//! A [`Facet`] is one singleton-capable component sitting on a host object. It
//! moves through [`FacetState`] exactly once: `Uninitialized → Initialized →
//! Disposed`. Initialization first claims the facet's type in the registry's
//! live-instance table; a facet that loses the claim is discarded (its host
//! object destroyed) before any initialization side effect runs.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use log::{debug, warn};

use crate::host::{HostRuntime, ObjectId};
use crate::{SingletonError, SingletonEvent, SingletonRegistry, TypeKey};

/// Behaviour hooks of a singleton component.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::SingletonBehaviour;
///
/// #[derive(Default, Clone)]
/// struct AudioManager {
///     volume: f32,
/// }
///
/// impl SingletonBehaviour for AudioManager {
///     fn on_initialize(&self) {
///         // open the audio device
///     }
/// }
/// ```
pub trait SingletonBehaviour: Any + Send + Sync {
    /// Runs once, after the instance became the canonical one for its type.
    fn on_initialize(&self) {}

    /// Runs once, after the instance left the live-instance table.
    fn on_dispose(&self) {}

    /// Whether the host object survives scene transitions.
    fn dont_destroy_on_load(&self) -> bool {
        true
    }
}

/// Lifecycle state of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetState {
    Uninitialized,
    Initialized,
    Disposed,
}

/// Outcome of [`Facet::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initialization {
    /// The facet is now the live instance of its type.
    Initialized,
    /// Nothing happened (already initialized, disposed, or not on a host object).
    Skipped,
    /// Another instance already owns the type; this facet's object was destroyed.
    Discarded { survivor_scene: String },
}

/// Notification listener.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// A singleton component: either a live instance on a host object, or an
/// unbound prototype held by a [`crate::Template`].
pub struct Facet {
    key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
    behaviour: Arc<dyn SingletonBehaviour>,
    object: OnceLock<ObjectId>,
    state: Mutex<FacetState>,
    on_initialize: Mutex<Vec<Listener>>,
    on_dispose: Mutex<Vec<Listener>>,
}

impl Facet {
    pub fn new<T: SingletonBehaviour>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: SingletonBehaviour>(value: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: value.clone(),
            behaviour: value,
            object: OnceLock::new(),
            state: Mutex::new(FacetState::Uninitialized),
            on_initialize: Mutex::new(Vec::new()),
            on_dispose: Mutex::new(Vec::new()),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }

    /// Host object carrying this facet; `None` for template prototypes.
    pub fn object(&self) -> Option<ObjectId> {
        self.object.get().copied()
    }

    /// Attaches the facet to its host object. The first binding wins.
    pub(crate) fn bind(&self, object: ObjectId) {
        if self.object.set(object).is_err() {
            debug!("{} already bound; keeping its first object", self.key);
        }
    }

    pub fn state(&self) -> FacetState {
        *lock(&self.state)
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == FacetState::Initialized
    }

    pub fn dont_destroy_on_load(&self) -> bool {
        self.behaviour.dont_destroy_on_load()
    }

    /// The component value, if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Subscribes to the `onInitialize` notification.
    pub fn subscribe_initialize(&self, listener: impl Fn() + Send + Sync + 'static) {
        lock(&self.on_initialize).push(Arc::new(listener));
    }

    /// Subscribes to the `onDispose` notification.
    pub fn subscribe_dispose(&self, listener: impl Fn() + Send + Sync + 'static) {
        lock(&self.on_dispose).push(Arc::new(listener));
    }

    /// Makes this facet the live instance of its type.
    ///
    /// If another instance already owns the type, this facet's host object is
    /// destroyed and nothing else happens: the facet stays `Uninitialized` and
    /// `onInitialize` never fires.
    pub fn initialize(
        self: &Arc<Self>,
        registry: &SingletonRegistry,
        host: &mut dyn HostRuntime,
    ) -> Initialization {
        match self.state() {
            FacetState::Initialized => {
                warn!("Singleton of type {} is already initialized", self.key);
                registry.emit_event(&SingletonEvent::AlreadyInitialized {
                    type_name: self.type_name(),
                });
                return Initialization::Skipped;
            }
            FacetState::Disposed => {
                warn!(
                    "Singleton of type {} was disposed and will not initialize again",
                    self.key
                );
                return Initialization::Skipped;
            }
            FacetState::Uninitialized => {}
        }

        let Some(object) = self.object() else {
            warn!(
                "Singleton of type {} is a prototype and cannot be initialized",
                self.key
            );
            return Initialization::Skipped;
        };

        if let Err(survivor) = registry.register(self) {
            let survivor_scene = survivor
                .object()
                .and_then(|o| host.scene_name(o))
                .unwrap_or_else(|| "<unknown>".to_string());
            let discarded_scene = host
                .scene_name(object)
                .unwrap_or_else(|| "<unknown>".to_string());

            warn!(
                "Singleton of type {} already exists in '{}' scene. Destroying this instance on '{}'.",
                self.key, survivor_scene, discarded_scene
            );
            registry.emit_event(&SingletonEvent::DuplicateDiscarded {
                type_name: self.type_name(),
                survivor_scene: survivor_scene.clone(),
                discarded_scene,
            });

            host.destroy_object(object);
            return Initialization::Discarded { survivor_scene };
        }

        if self.dont_destroy_on_load() {
            host.mark_long_lived(object);
        }

        *lock(&self.state) = FacetState::Initialized;

        self.behaviour.on_initialize();
        fire(&self.on_initialize);

        Initialization::Initialized
    }

    /// Removes this facet from the live-instance table.
    ///
    /// Returns `false` (with a warning) when the facet is not initialized.
    pub fn dispose(self: &Arc<Self>, registry: &SingletonRegistry) -> bool {
        if !self.is_initialized() {
            warn!("Singleton of type {} is not initialized", self.key);
            registry.emit_event(&SingletonEvent::NotInitialized {
                type_name: self.type_name(),
            });
            return false;
        }

        registry.unregister(self);

        *lock(&self.state) = FacetState::Disposed;

        self.behaviour.on_dispose();
        fire(&self.on_dispose);

        true
    }
}

fn fire(listeners: &Mutex<Vec<Listener>>) {
    // listeners may subscribe more listeners
    let snapshot = lock(listeners).clone();
    for listener in snapshot {
        listener();
    }
}

impl fmt::Debug for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facet")
            .field("type", &self.key.type_name())
            .field("object", &self.object())
            .field("state", &self.state())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Typed handle
// -------------------------------------------------------------------------------------------------

/// Typed handle to a facet holding a `T`.
///
/// Dereferences to the component value.
pub struct Singleton<T> {
    facet: Arc<Facet>,
    value: Arc<T>,
}

impl<T: SingletonBehaviour> Singleton<T> {
    pub(crate) fn new(facet: Arc<Facet>, value: Arc<T>) -> Self {
        Self { facet, value }
    }

    /// Wraps a facet, failing if it does not hold a `T`.
    pub fn from_facet(facet: Arc<Facet>) -> Result<Self, SingletonError> {
        let value = facet.downcast::<T>().ok_or(SingletonError::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        })?;
        Ok(Self { facet, value })
    }

    pub fn facet(&self) -> &Arc<Facet> {
        &self.facet
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    pub fn object(&self) -> Option<ObjectId> {
        self.facet.object()
    }

    pub fn state(&self) -> FacetState {
        self.facet.state()
    }

    /// Whether both handles point at the same facet.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.facet, &b.facet)
    }
}

impl<T> Clone for Singleton<T> {
    fn clone(&self) -> Self {
        Self {
            facet: self.facet.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T> Deref for Singleton<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Singleton").field(&self.facet).finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
