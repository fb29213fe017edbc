//! Macros for creating isolated plain-value singleton stores.

/// Creates a complete plain-value singleton store with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden)
/// - Trace callback static (hidden)
/// - An `Api` struct that implements `RawRegistryApi`, and its `API` constant
/// - Free functions delegating to `API`
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{define_raw_registry, RawSingleton};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// #[derive(Default)]
/// struct FrameCounter {
///     frames: AtomicU32,
/// }
///
/// impl RawSingleton for FrameCounter {}
///
/// define_raw_registry!(editor);
///
/// editor::instance::<FrameCounter>().frames.fetch_add(1, Ordering::SeqCst);
/// assert_eq!(editor::instance::<FrameCounter>().frames.load(Ordering::SeqCst), 1);
///
/// assert!(editor::dispose::<FrameCounter>());
/// assert!(!editor::contains::<FrameCounter>());
/// ```
///
/// # Multiple Stores
///
/// Each store is completely isolated:
///
/// ```rust
/// use singleton_lifecycle::{define_raw_registry, RawSingleton};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Cache;
/// impl RawSingleton for Cache {}
///
/// define_raw_registry!(left);
/// define_raw_registry!(right);
///
/// let a = left::instance::<Cache>();
/// let b = right::instance::<Cache>();
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
///
/// # Trait-Based Usage
///
/// ```rust
/// use singleton_lifecycle::{define_raw_registry, RawRegistryApi, RawSingleton};
///
/// #[derive(Default)]
/// struct Cache;
/// impl RawSingleton for Cache {}
///
/// define_raw_registry!(app);
///
/// app::API.instance::<Cache>();
/// assert!(app::API.contains::<Cache>());
/// ```
#[macro_export]
macro_rules! define_raw_registry {
    ($name:ident) => {
        pub mod $name {
            use std::collections::HashMap;
            use std::sync::{Arc, LazyLock, Mutex};

            static STORAGE: $crate::RawStorage = LazyLock::new(|| Mutex::new(HashMap::new()));

            static TRACE: $crate::RawTraceSlot = LazyLock::new(|| Mutex::new(None));

            /// Zero-sized handle of this store.
            ///
            /// All operations are provided by the `RawRegistryApi` trait's
            /// default implementations.
            #[derive(Debug, Clone, Copy)]
            pub struct Api;

            impl $crate::RawRegistryApi for Api {
                fn storage() -> &'static $crate::RawStorage {
                    &STORAGE
                }

                fn trace() -> &'static $crate::RawTraceSlot {
                    &TRACE
                }
            }

            /// Handle for trait-based access.
            pub const API: Api = Api;

            /// The live value of `T`, created on first access.
            pub fn instance<T: $crate::RawSingleton>() -> Arc<T> {
                use $crate::RawRegistryApi;
                API.instance::<T>()
            }

            /// Disposes the live value of `T`.
            pub fn dispose<T: $crate::RawSingleton>() -> bool {
                use $crate::RawRegistryApi;
                API.dispose::<T>()
            }

            pub fn contains<T: $crate::RawSingleton>() -> bool {
                use $crate::RawRegistryApi;
                API.contains::<T>()
            }

            pub fn subscribe_deinit<T: $crate::RawSingleton>(
                listener: impl Fn() + Send + Sync + 'static,
            ) -> bool {
                use $crate::RawRegistryApi;
                API.subscribe_deinit::<T>(listener)
            }

            pub fn set_trace_callback(
                callback: impl Fn(&$crate::SingletonEvent) + Send + Sync + 'static,
            ) {
                use $crate::RawRegistryApi;
                API.set_trace_callback(callback)
            }

            pub fn clear_trace_callback() {
                use $crate::RawRegistryApi;
                API.clear_trace_callback()
            }
        }
    };
}
