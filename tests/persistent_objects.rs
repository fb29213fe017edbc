//! Integration tests for persistent-object singletons and registry loading.

use singleton_lifecycle::{
    ObjectEntry, ObjectSource, RegistryConfig, RegistryOptions, ResourceFolder, ResourceLoader,
    SingletonEvent, SingletonObject, SingletonRegistry,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, PartialEq)]
struct GameSettings {
    difficulty: u8,
}

impl SingletonObject for GameSettings {}

#[derive(Debug, Default)]
struct LootTable {
    rolls: u32,
}

impl SingletonObject for LootTable {
    fn resource_name() -> String {
        "Loot/Default".to_string()
    }
}

fn registry(config: RegistryConfig, resources: Arc<ResourceFolder>, tooling: bool) -> Arc<SingletonRegistry> {
    SingletonRegistry::with_config(
        config,
        resources,
        RegistryOptions::default().with_tooling(tooling),
    )
}

fn record(registry: &SingletonRegistry) -> Arc<Mutex<Vec<SingletonEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    registry.set_trace_callback(move |event| events_clone.lock().unwrap().push(event.clone()));
    events
}

#[test]
fn test_configured_object_is_returned() {
    let resources = Arc::new(ResourceFolder::new().with_asset("GameSettings", GameSettings { difficulty: 9 }));
    let registry = registry(
        RegistryConfig::new().with_object(ObjectEntry::new(GameSettings { difficulty: 3 })),
        resources,
        false,
    );

    assert_eq!(registry.object::<GameSettings>().unwrap().difficulty, 3);
}

#[test]
fn test_object_loaded_by_conventional_name() {
    let resources = Arc::new(
        ResourceFolder::new()
            .with_asset("GameSettings", GameSettings { difficulty: 9 })
            .with_asset("Loot/Default", LootTable { rolls: 5 }),
    );
    let registry = registry(RegistryConfig::new(), resources, false);
    let events = record(&registry);

    assert_eq!(registry.object::<GameSettings>().unwrap().difficulty, 9);
    assert_eq!(registry.object::<LootTable>().unwrap().rolls, 5);
    assert_eq!(
        events.lock().unwrap()[0],
        SingletonEvent::ObjectResolved {
            type_name: std::any::type_name::<GameSettings>(),
            source: ObjectSource::Resources,
        }
    );
}

#[test]
fn test_missing_object_in_production_is_none() {
    let resources = Arc::new(ResourceFolder::new());
    let registry = registry(RegistryConfig::new(), resources.clone(), false);
    let events = record(&registry);

    assert!(registry.object::<GameSettings>().is_none());
    assert!(resources.persisted_paths().is_empty());
    assert_eq!(
        events.lock().unwrap().clone(),
        vec![SingletonEvent::ObjectMissing {
            type_name: std::any::type_name::<GameSettings>()
        }]
    );
}

#[test]
fn test_tooling_creates_and_persists_once() {
    let resources = Arc::new(ResourceFolder::new());
    let registry = registry(RegistryConfig::new(), resources.clone(), true);

    let first = registry.object::<GameSettings>().unwrap();
    let second = registry.object::<GameSettings>().unwrap();

    assert_eq!(*first, GameSettings::default());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(resources.persisted_paths(), vec!["Resources/GameSettings.asset"]);
    assert!(resources.load_named("GameSettings").is_some());
}

#[test]
fn test_tooling_uses_resource_root() {
    let resources = Arc::new(ResourceFolder::new());
    let registry = SingletonRegistry::with_config(
        RegistryConfig::new(),
        resources.clone(),
        RegistryOptions::default()
            .with_tooling(true)
            .with_resource_root("Assets/Data"),
    );

    registry.object::<LootTable>().unwrap();

    assert_eq!(resources.persisted_paths(), vec!["Assets/Data/Loot/Default.asset"]);
}

#[test]
fn test_load_takes_configuration_from_resources() {
    let config = RegistryConfig::new().with_object(ObjectEntry::new(GameSettings { difficulty: 2 }));
    let resources = Arc::new(ResourceFolder::new().with_asset("SingletonsStorage", config));

    let registry = SingletonRegistry::load(resources, RegistryOptions::default().with_tooling(false));

    assert_eq!(registry.object::<GameSettings>().unwrap().difficulty, 2);
}

#[test]
fn test_load_with_tooling_persists_empty_configuration() {
    let resources = Arc::new(ResourceFolder::new());

    let registry = SingletonRegistry::load(resources.clone(), RegistryOptions::default().with_tooling(true));

    assert!(registry.config().behaviours.is_empty());
    assert_eq!(resources.persisted_paths(), vec!["Resources/SingletonsStorage.asset"]);
}
