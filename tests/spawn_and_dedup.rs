//! Integration tests for the startup spawn: de-duplication, two-phase enabling
//! and configuration validation.

use singleton_lifecycle::host::{HostRuntime, ObjectHook, ObjectId, SceneGraph};
use singleton_lifecycle::{
    RegistryConfig, RegistryOptions, ResourceFolder, SingletonBehaviour, SingletonEvent,
    SingletonRegistry, Template,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

#[derive(Clone, Default)]
struct Logger {
    inits: Arc<AtomicUsize>,
}

impl SingletonBehaviour for Logger {
    fn on_initialize(&self) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct Config;
impl SingletonBehaviour for Config {}

#[derive(Clone, Default)]
struct Input;
impl SingletonBehaviour for Input {}

fn registry(config: RegistryConfig) -> Arc<SingletonRegistry> {
    registry_with(config, ResourceFolder::new())
}

fn registry_with(config: RegistryConfig, resources: ResourceFolder) -> Arc<SingletonRegistry> {
    SingletonRegistry::with_config(
        config,
        Arc::new(resources),
        RegistryOptions::default().with_tooling(false),
    )
}

fn record(registry: &SingletonRegistry) -> Arc<Mutex<Vec<SingletonEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    registry.set_trace_callback(move |event| events_clone.lock().unwrap().push(event.clone()));
    events
}

#[test]
fn test_duplicate_types_keep_first_instance() {
    let first = Logger::default();
    let second = Logger::default();
    let config = RegistryConfig::new()
        .with_behaviour(Arc::new(Template::new("Logger").with(first.clone())))
        .with_behaviour(Arc::new(Template::new("Logger").with(second.clone())))
        .with_behaviour(Arc::new(Template::new("Config").with(Config)));
    let registry = registry(config);
    let events = record(&registry);
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert_eq!(spawned.len(), 2);
    assert_eq!(host.object_count(), 2);
    assert_eq!(registry.live_count(), 2);
    assert!(registry.contains::<Logger>());
    assert!(registry.contains::<Config>());

    // the discarded copy never initialized
    assert_eq!(first.inits.load(Ordering::SeqCst), 1);
    assert_eq!(second.inits.load(Ordering::SeqCst), 0);

    let events = events.lock().unwrap();
    let discarded: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, SingletonEvent::DuplicateDiscarded { .. }))
        .collect();
    assert_eq!(discarded.len(), 1);
    assert!(discarded[0].is_warning());
    assert!(discarded[0].to_string().contains("Logger"));
}

#[test]
fn test_conflicting_facet_takes_whole_object() {
    let config = RegistryConfig::new()
        .with_behaviour(Arc::new(Template::new("Logger").with(Logger::default())))
        .with_behaviour(Arc::new(
            Template::new("Systems").with(Logger::default()).with(Config),
        ));
    let registry = registry(config);
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert_eq!(spawned.len(), 1);
    assert!(registry.contains::<Logger>());
    assert!(!registry.contains::<Config>());
    assert!(host.objects_named("Systems").is_empty());
}

#[test]
fn test_disabled_template_stays_disabled() {
    let template = Arc::new(Template::new("Config").with(Config).disabled());
    let registry = registry(RegistryConfig::new().with_behaviour(template.clone()));
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert_eq!(spawned.len(), 1);
    assert!(!host.is_active(spawned[0]));
    assert!(!template.is_enabled());
    // initialized regardless of the enabled flag
    assert!(registry.contains::<Config>());
}

#[test]
fn test_enabled_template_is_restored() {
    let template = Arc::new(Template::new("Config").with(Config));
    let registry = registry(
        RegistryConfig::new()
            .with_behaviour(template.clone())
            .with_behaviour(template.clone()),
    );
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert!(template.is_enabled());
    assert_eq!(spawned.len(), 1);
    assert!(host.is_active(spawned[0]));
}

/// Records, at enable time, whether `Config` was already live.
struct SiblingProbe {
    registry: Arc<OnceLock<Weak<SingletonRegistry>>>,
    saw_config: Arc<Mutex<Vec<bool>>>,
}

impl ObjectHook for SiblingProbe {
    fn on_awake(&self, _object: ObjectId, _host: &mut dyn HostRuntime) {
        self.probe();
    }

    fn on_enable(&self, _object: ObjectId, _host: &mut dyn HostRuntime) {
        self.probe();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SiblingProbe {
    fn probe(&self) {
        let live = self
            .registry
            .get()
            .and_then(Weak::upgrade)
            .is_some_and(|registry| registry.contains::<Config>());
        self.saw_config.lock().unwrap().push(live);
    }
}

#[test]
fn test_every_singleton_is_live_before_any_enables() {
    let slot = Arc::new(OnceLock::new());
    let saw_config = Arc::new(Mutex::new(Vec::new()));
    let probe = Arc::new(SiblingProbe {
        registry: slot.clone(),
        saw_config: saw_config.clone(),
    });

    // the probe sits on the entry spawned first
    let config = RegistryConfig::new()
        .with_behaviour(Arc::new(
            Template::new("Logger").with(Logger::default()).with_hook(probe),
        ))
        .with_behaviour(Arc::new(Template::new("Config").with(Config)));
    let registry = registry(config);
    slot.set(Arc::downgrade(&registry)).unwrap();

    let mut host = SceneGraph::default();
    host.play();
    registry.spawn(&mut host);

    assert_eq!(saw_config.lock().unwrap().clone(), vec![true, true]);
}

#[test]
fn test_spawn_before_play_initializes_without_waking() {
    let logger = Logger::default();
    let registry = registry(
        RegistryConfig::new().with_behaviour(Arc::new(Template::new("Logger").with(logger.clone()))),
    );
    let mut host = SceneGraph::default();

    registry.spawn(&mut host);
    assert!(registry.contains::<Logger>());

    host.play();
    assert_eq!(logger.inits.load(Ordering::SeqCst), 1);
    assert_eq!(registry.live_count(), 1);
}

#[test]
fn test_scanned_templates_are_spawned() {
    let input = Arc::new(Template::new("Input").with(Input));
    let resources = ResourceFolder::new()
        .with_template(input)
        .with_template(Arc::new(Template::new("Tree")));
    let registry = registry_with(RegistryConfig::new(), resources);
    let events = record(&registry);
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert_eq!(spawned.len(), 1);
    assert!(registry.contains::<Input>());
    assert_eq!(events.lock().unwrap()[0], SingletonEvent::Spawn { templates: 1 });
}

#[test]
fn test_configured_template_is_not_spawned_twice() {
    let input = Arc::new(Template::new("Input").with(Input));
    let resources = ResourceFolder::new().with_template(input.clone());
    let registry = registry_with(RegistryConfig::new().with_behaviour(input), resources);
    let events = record(&registry);
    let mut host = SceneGraph::default();
    host.play();

    registry.spawn(&mut host);

    assert_eq!(host.object_count(), 1);
    assert!(!events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, SingletonEvent::DuplicateDiscarded { .. })));
}

#[test]
fn test_repeated_scan_entry_is_excluded() {
    let input = Arc::new(Template::new("Input").with(Input));
    let resources = ResourceFolder::new()
        .with_template(input.clone())
        .with_template(input);
    let registry = registry_with(RegistryConfig::new(), resources);
    let events = record(&registry);
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert!(spawned.is_empty());
    assert!(!registry.contains::<Input>());
    assert!(events.lock().unwrap().contains(&SingletonEvent::DuplicateResource {
        name: "Input".into()
    }));
}

#[test]
fn test_spawn_prunes_empty_entries() {
    let config = RegistryConfig {
        behaviours: vec![None, Some(Arc::new(Template::new("Config").with(Config))), None],
        objects: Vec::new(),
    };
    let registry = registry(config);
    let events = record(&registry);
    let mut host = SceneGraph::default();
    host.play();

    let spawned = registry.spawn(&mut host);

    assert_eq!(spawned.len(), 1);
    assert_eq!(registry.config().behaviours.len(), 1);
    let events = events.lock().unwrap();
    assert_eq!(events[0], SingletonEvent::NullPruned { index: 0 });
    assert_eq!(events[1], SingletonEvent::NullPruned { index: 2 });
}

#[test]
fn test_repeated_configured_entry_is_reported_and_deduplicated() {
    let template = Arc::new(Template::new("Config").with(Config));
    let registry = registry(
        RegistryConfig::new()
            .with_behaviour(template.clone())
            .with_behaviour(template),
    );
    let events = record(&registry);
    let mut host = SceneGraph::default();
    host.play();

    registry.spawn(&mut host);

    assert_eq!(registry.live_count(), 1);
    assert_eq!(host.object_count(), 1);
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, SingletonEvent::DuplicateEntry { count: 2, .. }) && e.is_warning()));
}
