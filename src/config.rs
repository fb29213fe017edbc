//! Persisted registry configuration and runtime options.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::object::SingletonObject;
use crate::{EntryList, Template, TypeKey};

/// Default folder the resource system loads conventional names from.
pub const DEFAULT_RESOURCE_ROOT: &str = "Resources";

/// A configured persistent-object singleton.
#[derive(Clone)]
pub struct ObjectEntry {
    key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
}

impl ObjectEntry {
    pub fn new<T: SingletonObject>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: SingletonObject>(value: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn downcast<T: SingletonObject>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Whether both entries hold the very same object.
    pub fn same(&self, other: &ObjectEntry) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.value) as *const (),
            Arc::as_ptr(&other.value) as *const (),
        )
    }
}

impl fmt::Debug for ObjectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectEntry").field(&self.key.type_name()).finish()
    }
}

/// Problems found while validating a [`RegistryConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// An empty behaviour slot was removed. `index` is its position before pruning.
    NullPruned { index: usize },
    /// An entry appears `count` times in `list`. Left in place for the operator.
    Duplicate {
        list: EntryList,
        name: String,
        count: usize,
    },
}

/// The persisted singleton-of-singletons: curated behaviour templates and
/// persistent-object singletons.
///
/// Slots are `Option`s because a configured reference may dangle (the asset it
/// pointed at is gone); [`validate`](RegistryConfig::validate) prunes those.
#[derive(Clone, Default, Debug)]
pub struct RegistryConfig {
    pub behaviours: Vec<Option<Arc<Template>>>,
    pub objects: Vec<Option<ObjectEntry>>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(mut self, template: Arc<Template>) -> Self {
        self.behaviours.push(Some(template));
        self
    }

    pub fn with_object(mut self, entry: ObjectEntry) -> Self {
        self.objects.push(Some(entry));
        self
    }

    /// Pre-spawn validation: prunes empty behaviour slots, then reports duplicates.
    pub fn validate(&mut self) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = self
            .behaviours
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| ValidationIssue::NullPruned { index })
            .collect();

        self.behaviours.retain(Option::is_some);

        issues.extend(self.check());
        issues
    }

    /// Configuration-time check: reports duplicates in both lists, changes nothing.
    pub fn check(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let mut behaviours: Vec<(&Arc<Template>, usize)> = Vec::new();
        for template in self.behaviours.iter().flatten() {
            match behaviours.iter_mut().find(|(seen, _)| Arc::ptr_eq(*seen, template)) {
                Some((_, count)) => *count += 1,
                None => behaviours.push((template, 1)),
            }
        }
        issues.extend(
            behaviours
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(template, count)| ValidationIssue::Duplicate {
                    list: EntryList::Behaviours,
                    name: template.name().to_string(),
                    count,
                }),
        );

        let mut objects: Vec<(&ObjectEntry, usize)> = Vec::new();
        for entry in self.objects.iter().flatten() {
            match objects.iter_mut().find(|(seen, _)| seen.same(entry)) {
                Some((_, count)) => *count += 1,
                None => objects.push((entry, 1)),
            }
        }
        issues.extend(
            objects
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(entry, count)| ValidationIssue::Duplicate {
                    list: EntryList::Objects,
                    name: entry.key().short_name().to_string(),
                    count,
                }),
        );

        issues
    }
}

impl SingletonObject for RegistryConfig {
    fn resource_name() -> String {
        "SingletonsStorage".to_string()
    }
}

/// Runtime options of a [`crate::SingletonRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Tooling capability: create and persist missing persistent-object singletons.
    /// Defaults to the `tooling` cargo feature.
    pub tooling: bool,
    /// Location conventional resource names resolve under.
    pub resource_root: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            tooling: cfg!(feature = "tooling"),
            resource_root: DEFAULT_RESOURCE_ROOT.to_string(),
        }
    }
}

impl RegistryOptions {
    pub fn with_tooling(mut self, tooling: bool) -> Self {
        self.tooling = tooling;
        self
    }

    pub fn with_resource_root(mut self, root: impl Into<String>) -> Self {
        self.resource_root = root.into();
        self
    }

    /// Path a new asset named `name` is persisted at.
    pub fn asset_path(&self, name: &str) -> String {
        format!("{}/{}.asset", self.resource_root, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SingletonBehaviour;

    #[derive(Clone, Default)]
    struct Logger;
    impl SingletonBehaviour for Logger {}

    #[derive(Default)]
    struct GameConfig;
    impl SingletonObject for GameConfig {}

    #[test]
    fn test_validate_prunes_nulls() {
        let logger = Arc::new(Template::new("Logger").with(Logger));
        let mut config = RegistryConfig {
            behaviours: vec![None, Some(logger), None],
            objects: Vec::new(),
        };

        let issues = config.validate();

        assert_eq!(
            issues,
            vec![
                ValidationIssue::NullPruned { index: 0 },
                ValidationIssue::NullPruned { index: 2 },
            ]
        );
        assert_eq!(config.behaviours.len(), 1);
        assert!(config.behaviours.iter().all(Option::is_some));
    }

    #[test]
    fn test_duplicates_are_reported_not_removed() {
        let logger = Arc::new(Template::new("Logger").with(Logger));
        let settings = ObjectEntry::new(GameConfig);
        let mut config = RegistryConfig::new()
            .with_behaviour(logger.clone())
            .with_behaviour(logger)
            .with_object(settings.clone())
            .with_object(settings);

        let issues = config.validate();

        assert_eq!(
            issues,
            vec![
                ValidationIssue::Duplicate {
                    list: EntryList::Behaviours,
                    name: "Logger".into(),
                    count: 2,
                },
                ValidationIssue::Duplicate {
                    list: EntryList::Objects,
                    name: "GameConfig".into(),
                    count: 2,
                },
            ]
        );
        assert_eq!(config.behaviours.len(), 2);
        assert_eq!(config.objects.len(), 2);
    }

    #[test]
    fn test_equal_types_are_not_duplicates() {
        // same type, different templates: spawn resolves these, validation does not
        let config = RegistryConfig::new()
            .with_behaviour(Arc::new(Template::new("Logger").with(Logger)))
            .with_behaviour(Arc::new(Template::new("Logger").with(Logger)))
            .with_object(ObjectEntry::new(GameConfig))
            .with_object(ObjectEntry::new(GameConfig));

        assert!(config.check().is_empty());
    }

    #[test]
    fn test_check_leaves_nulls() {
        let config = RegistryConfig {
            behaviours: vec![None],
            objects: vec![None],
        };
        assert!(config.check().is_empty());
        assert_eq!(config.behaviours.len(), 1);
    }

    #[test]
    fn test_asset_path() {
        let options = RegistryOptions::default();
        assert_eq!(options.asset_path("GameConfig"), "Resources/GameConfig.asset");

        let options = options.with_resource_root("Data");
        assert_eq!(options.asset_path("GameConfig"), "Data/GameConfig.asset");
    }

    #[test]
    fn test_storage_resource_name() {
        assert_eq!(RegistryConfig::resource_name(), "SingletonsStorage");
        assert_eq!(GameConfig::resource_name(), "GameConfig");
    }
}
