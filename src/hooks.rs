//! Lifecycle hook pair.
//!
//! Every host object carrying singleton facets also carries an [`Initializer`]
//! and a [`Disposer`]. Their priorities bracket all user hooks on the object, so
//! facets are live before any user awake logic runs and stay live until every
//! user destroy hook has run, no matter how many facets share the object.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::facet::{Facet, FacetState};
use crate::host::{HostRuntime, ObjectHook, ObjectId};
use crate::{SingletonRegistry, TypeKey};

/// Priority of the initializer: before everything else.
pub const INITIALIZER_ORDER: i32 = -10_000;

/// Latest priority a user hook is expected to use.
pub const USER_ORDER_MAX: i32 = 9_998;

/// Priority of the disposer: right after the latest user hook.
pub const DISPOSER_ORDER: i32 = USER_ORDER_MAX + 1;

/// The singleton facets carried by one host object.
#[derive(Debug)]
pub(crate) struct FacetSet {
    facets: Vec<Arc<Facet>>,
}

impl FacetSet {
    pub(crate) fn new(facets: Vec<Arc<Facet>>) -> Self {
        Self { facets }
    }

    pub(crate) fn bind(&self, object: ObjectId) {
        for facet in &self.facets {
            facet.bind(object);
        }
    }

    pub(crate) fn find(&self, key: TypeKey) -> Option<Arc<Facet>> {
        self.facets.iter().find(|f| f.key() == key).cloned()
    }

    /// Initializes every facet still `Uninitialized`, stopping once the object
    /// is gone (a discarded duplicate takes the whole object with it).
    pub(crate) fn initialize_all(
        &self,
        registry: &SingletonRegistry,
        host: &mut dyn HostRuntime,
        object: ObjectId,
    ) {
        for facet in &self.facets {
            if !host.is_alive(object) {
                return;
            }
            if facet.state() == FacetState::Uninitialized {
                facet.initialize(registry, host);
            }
        }
    }

    pub(crate) fn dispose_all(&self, registry: &SingletonRegistry) {
        for facet in &self.facets {
            if facet.is_initialized() {
                facet.dispose(registry);
            }
        }
    }
}

/// Earliest hook on a singleton object: initializes its facets on awake.
pub struct Initializer {
    set: Arc<FacetSet>,
    registry: Weak<SingletonRegistry>,
}

impl Initializer {
    /// Facet of the given type on this object.
    pub fn facet(&self, key: TypeKey) -> Option<Arc<Facet>> {
        self.set.find(key)
    }

    pub(crate) fn belongs_to(&self, registry: &SingletonRegistry) -> bool {
        std::ptr::eq(self.registry.as_ptr(), registry)
    }
}

impl ObjectHook for Initializer {
    fn order(&self) -> i32 {
        INITIALIZER_ORDER
    }

    fn on_awake(&self, object: ObjectId, host: &mut dyn HostRuntime) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        self.set.bind(object);
        self.set.initialize_all(&registry, host, object);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Last hook on a singleton object: disposes its facets on destroy.
pub struct Disposer {
    set: Arc<FacetSet>,
    registry: Weak<SingletonRegistry>,
}

impl ObjectHook for Disposer {
    fn order(&self) -> i32 {
        DISPOSER_ORDER
    }

    fn on_destroy(&self, _object: ObjectId, _host: &mut dyn HostRuntime) {
        if let Some(registry) = self.registry.upgrade() {
            self.set.dispose_all(&registry);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds the initializer/disposer pair for one object.
pub(crate) fn pair(
    set: &Arc<FacetSet>,
    registry: &Arc<SingletonRegistry>,
) -> (Arc<dyn ObjectHook>, Arc<dyn ObjectHook>) {
    let initializer = Initializer {
        set: set.clone(),
        registry: Arc::downgrade(registry),
    };
    let disposer = Disposer {
        set: set.clone(),
        registry: Arc::downgrade(registry),
    };
    (Arc::new(initializer), Arc::new(disposer))
}
