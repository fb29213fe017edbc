//! The singleton registry service.
//!
//! A [`SingletonRegistry`] owns the configured templates, the live-instance
//! table (at most one live facet per type), the `instance` accessor cache and
//! the persistent-object cache. The application root creates one per context
//! and shares it as `Arc<SingletonRegistry>`; tests build their own.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::facet::{Facet, FacetState, Singleton, SingletonBehaviour};
use crate::hooks::{self, FacetSet, Initializer};
use crate::host::{HostRuntime, ObjectBlueprint, ObjectHook, ObjectId};
use crate::object::{self, SingletonObject};
use crate::{
    ObjectSource, RegistryConfig, RegistryOptions, ResourceLoader, SingletonEvent, Template,
    TypeKey, ValidationIssue,
};

/// Signature of the trace callback.
pub type TraceCallback = dyn Fn(&SingletonEvent) + Send + Sync + 'static;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// Registry of lifecycle-managed singletons.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use singleton_lifecycle::host::SceneGraph;
/// use singleton_lifecycle::{
///     RegistryConfig, RegistryOptions, ResourceFolder, SingletonBehaviour, SingletonRegistry,
///     Template,
/// };
///
/// #[derive(Default, Clone)]
/// struct Logger;
/// impl SingletonBehaviour for Logger {}
///
/// let config = RegistryConfig::new().with_behaviour(Arc::new(Template::new("Logger").with(Logger)));
/// let registry = SingletonRegistry::with_config(
///     config,
///     Arc::new(ResourceFolder::new()),
///     RegistryOptions::default(),
/// );
///
/// let mut host = SceneGraph::default();
/// host.play();
/// registry.spawn(&mut host);
///
/// let logger = registry.get::<Logger>(&mut host);
/// assert!(logger.facet().is_initialized());
/// ```
pub struct SingletonRegistry {
    config: Mutex<RegistryConfig>,
    resources: Arc<dyn ResourceLoader>,
    options: RegistryOptions,
    scanned: Mutex<Option<Vec<Arc<Template>>>>,
    live: Mutex<HashMap<TypeKey, Arc<Facet>>>,
    instances: Mutex<HashMap<TypeKey, Arc<Facet>>>,
    objects: Mutex<HashMap<TypeKey, Arc<dyn Any + Send + Sync>>>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
}

impl SingletonRegistry {
    // -------------------------------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------------------------------

    /// Builds a registry whose configuration is itself a persistent object,
    /// resolved from `resources` (or created, with the tooling capability).
    pub fn load(resources: Arc<dyn ResourceLoader>, options: RegistryOptions) -> Arc<Self> {
        let config = match object::resolve::<RegistryConfig>(&[], resources.as_ref(), &options) {
            Some((config, source)) => {
                debug!("Registry configuration resolved from {}", source);
                (*config).clone()
            }
            None => {
                warn!(
                    "No {} asset found; starting with an empty configuration",
                    RegistryConfig::resource_name()
                );
                RegistryConfig::default()
            }
        };

        Self::with_config(config, resources, options)
    }

    /// Builds a registry from an explicit configuration.
    pub fn with_config(
        config: RegistryConfig,
        resources: Arc<dyn ResourceLoader>,
        options: RegistryOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Mutex::new(config),
            resources,
            options,
            scanned: Mutex::new(None),
            live: Mutex::new(HashMap::new()),
            instances: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            trace: Mutex::new(None),
        })
    }

    /// The resource loader used for scans and persistent objects.
    pub fn resources(&self) -> &Arc<dyn ResourceLoader> {
        &self.resources
    }

    /// Capabilities this registry was built with.
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Sets a callback receiving every [`SingletonEvent`] of this registry.
    ///
    /// The callback runs without any registry lock held, so it may call back
    /// into the registry.
    pub fn set_trace_callback(&self, callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
        *lock(&self.trace) = Some(Arc::new(callback));
    }

    /// Removes the trace callback.
    pub fn clear_trace_callback(&self) {
        *lock(&self.trace) = None;
    }

    pub(crate) fn emit_event(&self, event: &SingletonEvent) {
        let callback = lock(&self.trace).clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------------------------------

    /// Snapshot of the current configuration.
    pub fn config(&self) -> RegistryConfig {
        lock(&self.config).clone()
    }

    /// Edits the configuration. The resource scan is redone on next use.
    pub fn update_config(&self, edit: impl FnOnce(&mut RegistryConfig)) {
        edit(&mut lock(&self.config));
        *lock(&self.scanned) = None;
    }

    /// Pre-spawn validation: prunes empty behaviour slots and reports duplicates.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let issues = lock(&self.config).validate();
        self.report(&issues);
        issues
    }

    /// Reports duplicates without changing anything.
    pub fn check(&self) -> Vec<ValidationIssue> {
        let issues = lock(&self.config).check();
        self.report(&issues);
        issues
    }

    fn report(&self, issues: &[ValidationIssue]) {
        for issue in issues {
            match issue {
                ValidationIssue::NullPruned { index } => {
                    info!("Removing empty singleton entry at index {}", index);
                    self.emit_event(&SingletonEvent::NullPruned { index: *index });
                }
                ValidationIssue::Duplicate { list, name, count } => {
                    warn!(
                        "Duplicate singleton entry in {}: {} appears {} times",
                        list, name, count
                    );
                    self.emit_event(&SingletonEvent::DuplicateEntry {
                        list: *list,
                        name: name.clone(),
                        count: *count,
                    });
                }
            }
        }
    }

    fn configured_templates(&self) -> Vec<Arc<Template>> {
        lock(&self.config).behaviours.iter().flatten().cloned().collect()
    }

    /// Singleton templates found by the resource scan, minus configured ones.
    pub fn scanned_templates(&self) -> Vec<Arc<Template>> {
        if let Some(scanned) = lock(&self.scanned).as_ref() {
            return scanned.clone();
        }

        let scanned = self.scan_resources();
        *lock(&self.scanned) = Some(scanned.clone());
        scanned
    }

    fn scan_resources(&self) -> Vec<Arc<Template>> {
        let configured = self.configured_templates();

        let mut found: Vec<(Arc<Template>, usize)> = Vec::new();
        for template in self.resources.load_all_templates() {
            if !template.is_singleton() || configured.iter().any(|c| Arc::ptr_eq(c, &template)) {
                continue;
            }
            match found.iter_mut().find(|(seen, _)| Arc::ptr_eq(seen, &template)) {
                Some((_, count)) => *count += 1,
                None => found.push((template, 1)),
            }
        }

        // a template the scan returns more than once is not spawned at all
        let mut scanned = Vec::with_capacity(found.len());
        for (template, count) in found {
            if count > 1 {
                warn!("Duplicate singleton template in resources: {}", template.name());
                self.emit_event(&SingletonEvent::DuplicateResource {
                    name: template.name().to_string(),
                });
            } else {
                scanned.push(template);
            }
        }

        debug!("Resource scan found {} singleton templates", scanned.len());
        scanned
    }

    // -------------------------------------------------------------------------------------------------
    // Spawning
    // -------------------------------------------------------------------------------------------------

    /// Startup spawn of every configured and scanned template.
    ///
    /// Runs in two phases: every copy is created disabled and its facets
    /// initialized, then each copy gets its template's enabled state back. User
    /// awake/enable logic therefore sees every singleton already registered.
    /// Returns the copies that survived de-duplication.
    pub fn spawn(self: &Arc<Self>, host: &mut dyn HostRuntime) -> Vec<ObjectId> {
        self.validate();

        lock(&self.live).clear();
        lock(&self.instances).clear();
        *lock(&self.scanned) = None;

        let mut entries = self.configured_templates();
        entries.extend(self.scanned_templates());

        info!("Spawning {} singleton templates", entries.len());
        self.emit_event(&SingletonEvent::Spawn {
            templates: entries.len(),
        });

        // captured up front: the same template may appear twice
        let enabled: Vec<bool> = entries.iter().map(|t| t.is_enabled()).collect();

        let mut copies = Vec::with_capacity(entries.len());
        for template in &entries {
            template.set_enabled(false);
            let (object, set) = self.instantiate_template(host, template);
            set.initialize_all(self, host, object);
            copies.push(object);
        }

        let mut survivors = Vec::with_capacity(copies.len());
        for ((template, object), enabled) in entries.iter().zip(copies).zip(enabled) {
            template.set_enabled(enabled);
            if host.is_alive(object) {
                host.set_active(object, enabled);
                survivors.push(object);
            }
        }

        survivors
    }

    /// Creates a copy of `template` on the host, as a scene would at runtime.
    pub fn instantiate(self: &Arc<Self>, host: &mut dyn HostRuntime, template: &Template) -> ObjectId {
        self.instantiate_template(host, template).0
    }

    fn instantiate_template(
        self: &Arc<Self>,
        host: &mut dyn HostRuntime,
        template: &Template,
    ) -> (ObjectId, Arc<FacetSet>) {
        let set = Arc::new(FacetSet::new(template.copy_facets()));
        let object = self.attach(
            host,
            template.name(),
            template.is_enabled(),
            &set,
            template.hooks(),
        );
        (object, set)
    }

    fn attach(
        self: &Arc<Self>,
        host: &mut dyn HostRuntime,
        name: &str,
        active: bool,
        set: &Arc<FacetSet>,
        extra_hooks: &[Arc<dyn ObjectHook>],
    ) -> ObjectId {
        let (initializer, disposer) = hooks::pair(set, self);
        let blueprint = extra_hooks
            .iter()
            .cloned()
            .fold(
                ObjectBlueprint::new(name, active)
                    .with_hook(initializer)
                    .with_hook(disposer),
                ObjectBlueprint::with_hook,
            );

        let object = host.instantiate_copy(blueprint);
        // already bound if the copy woke up inside instantiate_copy
        set.bind(object);
        object
    }

    // -------------------------------------------------------------------------------------------------
    // Live-instance table
    // -------------------------------------------------------------------------------------------------

    /// Claims the facet's type. On conflict the current owner is returned.
    pub(crate) fn register(&self, facet: &Arc<Facet>) -> Result<(), Arc<Facet>> {
        {
            let mut live = lock(&self.live);
            if let Some(owner) = live.get(&facet.key()) {
                return if Arc::ptr_eq(owner, facet) {
                    Ok(())
                } else {
                    Err(owner.clone())
                };
            }
            live.insert(facet.key(), facet.clone());
        }

        debug!("Registered singleton {}", facet.key());
        self.emit_event(&SingletonEvent::Register {
            type_name: facet.type_name(),
        });
        Ok(())
    }

    /// Releases the facet's claim. Another facet's claim is left alone.
    pub(crate) fn unregister(&self, facet: &Arc<Facet>) -> bool {
        {
            let mut live = lock(&self.live);
            match live.get(&facet.key()) {
                Some(owner) if Arc::ptr_eq(owner, facet) => {
                    live.remove(&facet.key());
                }
                _ => return false,
            }
        }

        {
            let mut instances = lock(&self.instances);
            if instances
                .get(&facet.key())
                .is_some_and(|cached| Arc::ptr_eq(cached, facet))
            {
                instances.remove(&facet.key());
            }
        }

        debug!("Unregistered singleton {}", facet.key());
        self.emit_event(&SingletonEvent::Unregister {
            type_name: facet.type_name(),
        });
        true
    }

    /// The live instance of `T`, if one is registered.
    pub fn live<T: SingletonBehaviour>(&self) -> Option<Singleton<T>> {
        let facet = lock(&self.live).get(&TypeKey::of::<T>()).cloned()?;
        Singleton::from_facet(facet).ok()
    }

    pub fn contains<T: SingletonBehaviour>(&self) -> bool {
        lock(&self.live).contains_key(&TypeKey::of::<T>())
    }

    pub fn live_count(&self) -> usize {
        lock(&self.live).len()
    }

    /// Every live facet, in no particular order.
    pub fn live_facets(&self) -> Vec<Arc<Facet>> {
        lock(&self.live).values().cloned().collect()
    }

    // -------------------------------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------------------------------

    /// Returns the singleton of type `T`. Never fails.
    ///
    /// While the host runs this is the live instance. Otherwise the prototype
    /// from the configured templates, then from the scanned ones, is returned
    /// (useful for tooling). When nothing matches, any live host object carrying
    /// a `T` is used, and as a last resort a new object named after `T` is
    /// created.
    pub fn get<T>(self: &Arc<Self>, host: &mut dyn HostRuntime) -> Singleton<T>
    where
        T: SingletonBehaviour + Default,
    {
        let key = TypeKey::of::<T>();

        let found = if host.is_running() {
            lock(&self.live).get(&key).cloned()
        } else {
            self.configured_templates()
                .iter()
                .find_map(|template| template.prototype(key))
                .or_else(|| {
                    self.scanned_templates()
                        .iter()
                        .find_map(|template| template.prototype(key))
                })
        };

        if let Some(handle) = found.and_then(|facet| Singleton::from_facet(facet).ok()) {
            return handle;
        }

        info!("No singleton of type {} found; searching host objects", key);
        self.emit_event(&SingletonEvent::NotFound {
            type_name: key.type_name(),
        });

        if let Some(handle) = self
            .find_live_object(host, key)
            .and_then(|facet| Singleton::from_facet(facet).ok())
        {
            return handle;
        }

        self.create_ad_hoc(host)
    }

    /// Cached [`get`](Self::get). While the host runs the cached facet is
    /// only returned if it still owns the live table; otherwise it is refreshed
    /// once disposed or once its host object is gone.
    pub fn instance<T>(self: &Arc<Self>, host: &mut dyn HostRuntime) -> Singleton<T>
    where
        T: SingletonBehaviour + Default,
    {
        let key = TypeKey::of::<T>();

        let cached = lock(&self.instances).get(&key).cloned();
        if let Some(facet) = cached {
            // while running only the live owner is current
            let stale = if host.is_running() {
                !lock(&self.live)
                    .get(&key)
                    .is_some_and(|owner| Arc::ptr_eq(owner, &facet))
            } else {
                facet.object().is_some_and(|object| {
                    facet.state() == FacetState::Disposed || !host.is_alive(object)
                })
            };
            if !stale {
                if let Ok(handle) = Singleton::from_facet(facet) {
                    return handle;
                }
            }
        }

        let handle = self.get::<T>(host);
        lock(&self.instances).insert(key, handle.facet().clone());
        handle
    }

    /// A host object of this registry carrying a `T`. While the host runs,
    /// objects that never woke up (inactive ones) do not count.
    fn find_live_object(&self, host: &dyn HostRuntime, key: TypeKey) -> Option<Arc<Facet>> {
        let running = host.is_running();
        let usable = |initializer: &Initializer| {
            initializer.belongs_to(self)
                && initializer.facet(key).is_some_and(|facet| match facet.state() {
                    FacetState::Initialized => true,
                    FacetState::Uninitialized => !running,
                    FacetState::Disposed => false,
                })
        };

        let hook = host.find_hook(&|hook: &dyn ObjectHook| {
            hook.as_any()
                .downcast_ref::<Initializer>()
                .is_some_and(|initializer| usable(initializer))
        })?;

        hook.as_any()
            .downcast_ref::<Initializer>()
            .and_then(|initializer| initializer.facet(key))
    }

    fn create_ad_hoc<T>(self: &Arc<Self>, host: &mut dyn HostRuntime) -> Singleton<T>
    where
        T: SingletonBehaviour + Default,
    {
        let key = TypeKey::of::<T>();

        warn!("Creating a new host object for singleton {}", key);
        self.emit_event(&SingletonEvent::AdHocCreated {
            type_name: key.type_name(),
        });

        let value = Arc::new(T::default());
        let facet = Arc::new(Facet::from_arc(value.clone()));
        let set = Arc::new(FacetSet::new(vec![facet.clone()]));
        self.attach(host, key.short_name(), true, &set, &[]);

        Singleton::new(facet, value)
    }

    // -------------------------------------------------------------------------------------------------
    // Persistent objects
    // -------------------------------------------------------------------------------------------------

    /// Resolves the persistent-object singleton of type `T`.
    ///
    /// Looks in the cache, the configured object list, then the resources under
    /// `T::resource_name()`. With the tooling capability a missing object is
    /// created and persisted. The first success is cached.
    pub fn object<T: SingletonObject>(&self) -> Option<Arc<T>> {
        let key = TypeKey::of::<T>();

        let cached = lock(&self.objects).get(&key).cloned();
        if let Some(found) = cached.and_then(|any| any.downcast::<T>().ok()) {
            self.emit_event(&SingletonEvent::ObjectResolved {
                type_name: key.type_name(),
                source: ObjectSource::Cache,
            });
            return Some(found);
        }

        let configured = lock(&self.config).objects.clone();
        match object::resolve::<T>(&configured, self.resources.as_ref(), &self.options) {
            Some((found, source)) => {
                lock(&self.objects).insert(key, found.clone());
                debug!("Resolved {} from {}", key, source);
                self.emit_event(&SingletonEvent::ObjectResolved {
                    type_name: key.type_name(),
                    source,
                });
                Some(found)
            }
            None => {
                warn!("No instance of {} found", key);
                self.emit_event(&SingletonEvent::ObjectMissing {
                    type_name: key.type_name(),
                });
                None
            }
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Reset
    // -------------------------------------------------------------------------------------------------

    /// Forgets every live instance and cached lookup. Host objects are untouched.
    ///
    /// Intended for tests and editor tooling.
    #[doc(hidden)]
    pub fn reset(&self) {
        self.emit_event(&SingletonEvent::Clear {});

        lock(&self.live).clear();
        lock(&self.instances).clear();
        lock(&self.objects).clear();
        *lock(&self.scanned) = None;
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("live", &self.live_count())
            .field("options", &self.options)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
