//! Host runtime collaborator.
//!
//! The registry never instantiates or tears down objects itself. It talks to the
//! host through [`HostRuntime`] and hangs its lifecycle hooks on host objects as
//! [`ObjectHook`]s. [`SceneGraph`] is a small in-memory host that follows the
//! usual component-runtime rules (awake once, hooks in priority order, scenes
//! and long-lived objects) and is what the crate's own tests run against.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

/// Scene that long-lived objects are moved into.
pub const LONG_LIVED_SCENE: &str = "DontDestroyOnLoad";

/// Opaque handle of a host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Wraps a host-specific handle.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A per-object callback attached to a host object.
///
/// The host runs the hooks of one object in ascending [`order`](ObjectHook::order).
/// Every callback receives the host itself, so hooks may create, destroy or
/// toggle objects (including their own) while they run.
pub trait ObjectHook: Any + Send + Sync {
    /// Execution priority; lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// The object woke up. Runs once, the first time the object is active while
    /// the host is running.
    fn on_awake(&self, _object: ObjectId, _host: &mut dyn HostRuntime) {}

    /// The object became active while the host is running.
    fn on_enable(&self, _object: ObjectId, _host: &mut dyn HostRuntime) {}

    /// The object is being torn down.
    fn on_destroy(&self, _object: ObjectId, _host: &mut dyn HostRuntime) {}

    fn as_any(&self) -> &dyn Any;
}

/// Description of an object to create: its name, initial active state and hooks.
pub struct ObjectBlueprint {
    name: String,
    active: bool,
    hooks: Vec<Arc<dyn ObjectHook>>,
}

impl ObjectBlueprint {
    pub fn new(name: impl Into<String>, active: bool) -> Self {
        Self {
            name: name.into(),
            active,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn ObjectHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hooks(&self) -> &[Arc<dyn ObjectHook>] {
        &self.hooks
    }

    /// Splits the blueprint for host implementations.
    pub fn into_parts(self) -> (String, bool, Vec<Arc<dyn ObjectHook>>) {
        (self.name, self.active, self.hooks)
    }
}

impl fmt::Debug for ObjectBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBlueprint")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Operations the registry needs from the host object runtime.
pub trait HostRuntime {
    /// Whether the host is in its running (play) phase.
    fn is_running(&self) -> bool;

    /// Creates an object from a blueprint. If the object is active and the host
    /// is running, its awake and enable hooks run before this returns.
    fn instantiate_copy(&mut self, blueprint: ObjectBlueprint) -> ObjectId;

    /// Tears the object down, running its destroy hooks. Unknown or already
    /// destroyed objects are ignored.
    fn destroy_object(&mut self, object: ObjectId);

    fn set_active(&mut self, object: ObjectId, active: bool);

    /// The object's own active flag (`false` for unknown objects).
    fn is_active(&self, object: ObjectId) -> bool;

    /// The object exists and is not being torn down.
    fn is_alive(&self, object: ObjectId) -> bool;

    /// Keeps the object alive across scene transitions.
    fn mark_long_lived(&mut self, object: ObjectId);

    fn object_name(&self, object: ObjectId) -> Option<String>;

    fn scene_name(&self, object: ObjectId) -> Option<String>;

    /// First hook on a live object that matches `predicate`.
    fn find_hook(
        &self,
        predicate: &dyn Fn(&dyn ObjectHook) -> bool,
    ) -> Option<Arc<dyn ObjectHook>>;
}

// -------------------------------------------------------------------------------------------------
// SceneGraph
// -------------------------------------------------------------------------------------------------

struct HostObject {
    name: String,
    scene: String,
    active: bool,
    awoken: bool,
    destroying: bool,
    hooks: Vec<Arc<dyn ObjectHook>>,
}

/// In-memory host: named objects living in scenes, driven by hooks.
pub struct SceneGraph {
    next_id: u64,
    running: bool,
    active_scene: String,
    objects: BTreeMap<ObjectId, HostObject>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new("Main")
    }
}

impl SceneGraph {
    /// An idle host with `scene` loaded.
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            next_id: 1,
            running: false,
            active_scene: scene.into(),
            objects: BTreeMap::new(),
        }
    }

    /// Enters the running phase and wakes every active object.
    pub fn play(&mut self) {
        self.running = true;

        let sleeping: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, o)| o.active && !o.awoken)
            .map(|(id, _)| *id)
            .collect();

        for id in sleeping {
            // an earlier hook may have destroyed or woken it
            if self.objects.get(&id).is_some_and(|o| !o.awoken && !o.destroying) {
                self.awaken(id);
            }
        }
    }

    /// Destroys every object and leaves the running phase.
    pub fn stop(&mut self) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in ids {
            self.destroy_object(id);
        }
        self.running = false;
    }

    /// Switches scenes, destroying every object that is not long-lived.
    pub fn load_scene(&mut self, scene: impl Into<String>) {
        let doomed: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, o)| o.scene != LONG_LIVED_SCENE)
            .map(|(id, _)| *id)
            .collect();

        for id in doomed {
            self.destroy_object(id);
        }

        self.active_scene = scene.into();
        debug!("Loaded scene {}", self.active_scene);
    }

    pub fn active_scene(&self) -> &str {
        &self.active_scene
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Live objects with the given name, oldest first.
    pub fn objects_named(&self, name: &str) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, o)| o.name == name && !o.destroying)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Attaches another hook to an existing object.
    pub fn add_hook(&mut self, object: ObjectId, hook: Arc<dyn ObjectHook>) {
        if let Some(host_object) = self.objects.get_mut(&object) {
            host_object.hooks.push(hook);
            host_object.hooks.sort_by_key(|h| h.order());
        }
    }

    fn hooks_of(&self, object: ObjectId) -> Vec<Arc<dyn ObjectHook>> {
        self.objects
            .get(&object)
            .map(|o| o.hooks.clone())
            .unwrap_or_default()
    }

    fn awaken(&mut self, object: ObjectId) {
        match self.objects.get_mut(&object) {
            Some(host_object) => host_object.awoken = true,
            None => return,
        }

        for hook in self.hooks_of(object) {
            if !self.is_alive(object) {
                return;
            }
            hook.on_awake(object, self);
        }

        self.enable(object);
    }

    fn enable(&mut self, object: ObjectId) {
        for hook in self.hooks_of(object) {
            if !self.is_alive(object) || !self.is_active(object) {
                return;
            }
            hook.on_enable(object, self);
        }
    }
}

impl HostRuntime for SceneGraph {
    fn is_running(&self) -> bool {
        self.running
    }

    fn instantiate_copy(&mut self, blueprint: ObjectBlueprint) -> ObjectId {
        let (name, active, mut hooks) = blueprint.into_parts();
        hooks.sort_by_key(|h| h.order());

        let id = ObjectId(self.next_id);
        self.next_id += 1;

        debug!("Instantiating {} as {} (active: {})", name, id, active);

        self.objects.insert(
            id,
            HostObject {
                name,
                scene: self.active_scene.clone(),
                active,
                awoken: false,
                destroying: false,
                hooks,
            },
        );

        if self.running && active {
            self.awaken(id);
        }

        id
    }

    fn destroy_object(&mut self, object: ObjectId) {
        match self.objects.get_mut(&object) {
            Some(host_object) if !host_object.destroying => host_object.destroying = true,
            _ => return,
        }

        debug!("Destroying {}", object);

        for hook in self.hooks_of(object) {
            hook.on_destroy(object, self);
        }

        self.objects.remove(&object);
    }

    fn set_active(&mut self, object: ObjectId, active: bool) {
        let (was_active, awoken) = match self.objects.get_mut(&object) {
            Some(host_object) if !host_object.destroying => {
                let was_active = host_object.active;
                host_object.active = active;
                (was_active, host_object.awoken)
            }
            _ => return,
        };

        if self.running && active && !was_active {
            if awoken {
                self.enable(object);
            } else {
                self.awaken(object);
            }
        }
    }

    fn is_active(&self, object: ObjectId) -> bool {
        self.objects.get(&object).is_some_and(|o| o.active)
    }

    fn is_alive(&self, object: ObjectId) -> bool {
        self.objects.get(&object).is_some_and(|o| !o.destroying)
    }

    fn mark_long_lived(&mut self, object: ObjectId) {
        if let Some(host_object) = self.objects.get_mut(&object) {
            host_object.scene = LONG_LIVED_SCENE.to_string();
        }
    }

    fn object_name(&self, object: ObjectId) -> Option<String> {
        self.objects.get(&object).map(|o| o.name.clone())
    }

    fn scene_name(&self, object: ObjectId) -> Option<String> {
        self.objects.get(&object).map(|o| o.scene.clone())
    }

    fn find_hook(
        &self,
        predicate: &dyn Fn(&dyn ObjectHook) -> bool,
    ) -> Option<Arc<dyn ObjectHook>> {
        self.objects
            .values()
            .filter(|o| !o.destroying)
            .flat_map(|o| o.hooks.iter())
            .find(|hook| predicate(hook.as_ref()))
            .cloned()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
