//! Resource/asset collaborator.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::{SingletonError, Template};

/// What the registry needs from the resource system. All calls are synchronous.
pub trait ResourceLoader: Send + Sync {
    /// Every template in the default resource location.
    fn load_all_templates(&self) -> Vec<Arc<Template>>;

    /// The asset stored under `name`, if any.
    fn load_named(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Stores a newly created asset at `path`. Only used with the tooling
    /// capability enabled.
    fn persist_new(&self, path: &str, asset: Arc<dyn Any + Send + Sync>)
        -> Result<(), SingletonError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// In-memory resource location: a template folder plus named assets.
///
/// Persisted assets become loadable under their file stem
/// (`Resources/GameConfig.asset` → `GameConfig`).
#[derive(Default)]
pub struct ResourceFolder {
    templates: Mutex<Vec<Arc<Template>>>,
    assets: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    persisted: Mutex<Vec<String>>,
    read_only: AtomicBool,
}

impl ResourceFolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, template: Arc<Template>) -> Self {
        self.add_template(template);
        self
    }

    pub fn with_asset<T: Any + Send + Sync>(self, name: impl Into<String>, asset: T) -> Self {
        self.insert_asset(name, Arc::new(asset));
        self
    }

    pub fn add_template(&self, template: Arc<Template>) {
        lock(&self.templates).push(template);
    }

    pub fn insert_asset(&self, name: impl Into<String>, asset: Arc<dyn Any + Send + Sync>) {
        lock(&self.assets).insert(name.into(), asset);
    }

    /// Rejects every later `persist_new`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Paths written through `persist_new`, oldest first.
    pub fn persisted_paths(&self) -> Vec<String> {
        lock(&self.persisted).clone()
    }
}

impl ResourceLoader for ResourceFolder {
    fn load_all_templates(&self) -> Vec<Arc<Template>> {
        lock(&self.templates).clone()
    }

    fn load_named(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        lock(&self.assets).get(name).cloned()
    }

    fn persist_new(
        &self,
        path: &str,
        asset: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), SingletonError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(SingletonError::ReadOnly {
                path: path.to_string(),
            });
        }

        let name = Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| SingletonError::PersistFailed {
                path: path.to_string(),
                reason: "path has no file name".to_string(),
            })?;

        let mut assets = lock(&self.assets);
        if assets.contains_key(name) {
            return Err(SingletonError::PersistFailed {
                path: path.to_string(),
                reason: format!("asset '{}' already exists", name),
            });
        }
        assets.insert(name.to_string(), asset);
        drop(assets);

        debug!("Persisted asset {}", path);
        lock(&self.persisted).push(path.to_string());
        Ok(())
    }
}
