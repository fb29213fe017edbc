//! Plain-value singletons: no host object, created lazily on first access and
//! disposed at process shutdown.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use crate::{RawRegistryApi, RawStorage, RawTraceSlot};

/// A plain-value singleton.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{RawSingleton, RawSingletonExt};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// #[derive(Default)]
/// struct IdGenerator {
///     next: AtomicU32,
/// }
///
/// impl RawSingleton for IdGenerator {}
///
/// let first = IdGenerator::instance().next.fetch_add(1, Ordering::SeqCst);
/// let second = IdGenerator::instance().next.fetch_add(1, Ordering::SeqCst);
/// assert_eq!(second, first + 1);
/// ```
pub trait RawSingleton: Default + Send + Sync + 'static {
    /// Runs once, right after the value was created.
    fn on_init(&self) {}

    /// Runs once, when the value is disposed.
    fn on_deinit(&self) {}
}

static STORAGE: RawStorage = LazyLock::new(|| Mutex::new(HashMap::new()));

static TRACE: RawTraceSlot = LazyLock::new(|| Mutex::new(None));

/// The process-wide plain-value store behind [`RawSingletonExt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRegistry;

impl RawRegistryApi for ProcessRegistry {
    fn storage() -> &'static RawStorage {
        &STORAGE
    }

    fn trace() -> &'static RawTraceSlot {
        &TRACE
    }
}

/// Handle of the process-wide store.
pub const PROCESS: ProcessRegistry = ProcessRegistry;

/// `T::instance()`-style access to the process-wide store.
pub trait RawSingletonExt: RawSingleton {
    fn instance() -> Arc<Self> {
        PROCESS.instance::<Self>()
    }

    fn dispose() -> bool {
        PROCESS.dispose::<Self>()
    }

    fn is_alive() -> bool {
        PROCESS.contains::<Self>()
    }

    fn subscribe_deinit(listener: impl Fn() + Send + Sync + 'static) -> bool {
        PROCESS.subscribe_deinit::<Self>(listener)
    }
}

impl<T: RawSingleton> RawSingletonExt for T {}
