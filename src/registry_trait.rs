//! Core trait of the plain-value singleton stores.
//!
//! This module provides the `RawRegistryApi` trait with default implementations
//! for lazy creation, disposal and tracing of plain-value singletons.
//!
//! A store is type-based: each type (`TypeId`) has at most one live value. The
//! value is created on first access and lives until it is disposed, either
//! explicitly or by the process-shutdown hook.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use log::debug;

use crate::raw::RawSingleton;
use crate::shutdown::{self, QuitToken};
use crate::{Listener, SingletonEvent, TraceCallback};

/// One live plain-value singleton.
pub struct RawSlot {
    value: Arc<dyn Any + Send + Sync>,
    token: QuitToken,
    on_deinit: Vec<Listener>,
}

/// Type alias for the storage static of a store.
///
/// Note: the `define_raw_registry!` macro names this type. Keep both in sync.
pub type RawStorage = LazyLock<Mutex<HashMap<TypeId, RawSlot>>>;

/// Type alias for the trace callback static of a store.
pub type RawTraceSlot = LazyLock<Mutex<Option<Arc<TraceCallback>>>>;

fn lock<T>(mutex: &'static Mutex<T>) -> MutexGuard<'static, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// Core trait defining plain-value store behavior.
///
/// Provides default implementations for all operations, requiring only two
/// accessor methods (`storage` and `trace`) from the implementor. Implementors
/// are zero-sized handles; the shutdown hook keeps a copy of the handle.
pub trait RawRegistryApi: Copy + Send + Sync + 'static {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace callback static.
    fn trace() -> &'static RawTraceSlot;

    /// Set a tracing callback for store operations.
    ///
    /// The callback is invoked without any store lock held.
    fn set_trace_callback(&self, callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
        *lock(Self::trace()) = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    fn clear_trace_callback(&self) {
        *lock(Self::trace()) = None;
    }

    /// Convenience wrapper to emit an event using the current callback.
    fn emit_event(&self, event: &SingletonEvent) {
        let callback = lock(Self::trace()).clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Store
    // -------------------------------------------------------------------------------------------------

    /// Access the storage static.
    fn storage() -> &'static RawStorage;

    /// The live value of `T`, created on first access.
    ///
    /// Creation publishes exactly one value per type: if two callers race, the
    /// loser's value is dropped before `on_init` runs, and `on_init` runs once.
    /// A fresh value subscribes to the shutdown hook.
    fn instance<T: RawSingleton>(&self) -> Arc<T> {
        let id = TypeId::of::<T>();

        if let Some(found) = lock(Self::storage()).get(&id).and_then(downcast::<T>) {
            return found;
        }

        // built outside the lock: `Default` may touch other singletons
        let created = Arc::new(T::default());

        let (value, fresh) = {
            let mut storage = lock(Self::storage());
            match storage.get(&id).and_then(downcast::<T>) {
                Some(existing) => (existing, false),
                None => {
                    let api = *self;
                    let token = shutdown::subscribe(move || {
                        api.dispose::<T>();
                    });
                    storage.insert(
                        id,
                        RawSlot {
                            value: created.clone(),
                            token,
                            on_deinit: Vec::new(),
                        },
                    );
                    (created, true)
                }
            }
        };

        if fresh {
            debug!("Created plain singleton {}", std::any::type_name::<T>());
            self.emit_event(&SingletonEvent::RawCreate {
                type_name: std::any::type_name::<T>(),
            });
            value.on_init();
        }

        value
    }

    /// Disposes the live value of `T`. A later `instance` creates a new one.
    ///
    /// Returns `false` when there is no live value.
    fn dispose<T: RawSingleton>(&self) -> bool {
        let slot = lock(Self::storage()).remove(&TypeId::of::<T>());
        let Some(slot) = slot else {
            return false;
        };

        shutdown::unsubscribe(slot.token);

        if let Some(value) = downcast::<T>(&slot) {
            value.on_deinit();
        }
        for listener in &slot.on_deinit {
            listener();
        }

        self.emit_event(&SingletonEvent::RawDispose {
            type_name: std::any::type_name::<T>(),
        });
        true
    }

    /// Check if `T` currently has a live value.
    fn contains<T: RawSingleton>(&self) -> bool {
        lock(Self::storage()).contains_key(&TypeId::of::<T>())
    }

    /// Subscribes to the deinit notification of the live value of `T`.
    ///
    /// Returns `false` when there is no live value to subscribe to.
    fn subscribe_deinit<T: RawSingleton>(&self, listener: impl Fn() + Send + Sync + 'static) -> bool {
        match lock(Self::storage()).get_mut(&TypeId::of::<T>()) {
            Some(slot) => {
                slot.on_deinit.push(Arc::new(listener));
                true
            }
            None => false,
        }
    }

    /// Drops every live value without running deinit logic.
    ///
    /// This method is primarily intended for testing. Already retrieved
    /// `Arc<T>` handles stay valid.
    #[doc(hidden)]
    fn clear(&self) {
        self.emit_event(&SingletonEvent::Clear {});

        let slots = std::mem::take(&mut *lock(Self::storage()));
        for slot in slots.into_values() {
            shutdown::unsubscribe(slot.token);
        }
    }
}

fn downcast<T: RawSingleton>(slot: &RawSlot) -> Option<Arc<T>> {
    slot.value.clone().downcast::<T>().ok()
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
