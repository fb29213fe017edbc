//! # Singleton Lifecycle
//!
//! Lifecycle-managed singletons for component-based runtimes.
//!
//! Three kinds of singletons are supported:
//!
//! - **Behavioural singletons** ([`SingletonBehaviour`]): components living on
//!   host objects. They are spawned from configured [`Template`]s before the
//!   first scene loads, de-duplicated (the first instance of a type wins, later
//!   ones are destroyed before they initialize) and optionally kept alive across
//!   scene transitions.
//! - **Persistent-object singletons** ([`SingletonObject`]): configuration/data
//!   objects resolved from the configuration, then the resource system, and with
//!   the `tooling` capability created and persisted on demand.
//! - **Plain-value singletons** ([`RawSingleton`]): created lazily on first
//!   access and disposed at process shutdown.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use singleton_lifecycle::host::SceneGraph;
//! use singleton_lifecycle::{
//!     RegistryConfig, RegistryOptions, ResourceFolder, SingletonBehaviour, SingletonRegistry,
//!     Template,
//! };
//!
//! #[derive(Default, Clone)]
//! struct AudioManager {
//!     volume: f32,
//! }
//!
//! impl SingletonBehaviour for AudioManager {}
//!
//! let config = RegistryConfig::new()
//!     .with_behaviour(Arc::new(Template::new("Audio").with(AudioManager { volume: 0.8 })));
//! let registry = SingletonRegistry::with_config(
//!     config,
//!     Arc::new(ResourceFolder::new()),
//!     RegistryOptions::default(),
//! );
//!
//! let mut host = SceneGraph::default();
//! host.play();
//! registry.spawn(&mut host);
//!
//! let audio = registry.instance::<AudioManager>(&mut host);
//! assert_eq!(audio.volume, 0.8);
//! ```
//!
//! ## Features
//!
//! - **Explicit registry**: one [`SingletonRegistry`] per context, no hidden statics
//! - **Two-phase startup**: every singleton is registered before any user awake logic runs
//! - **Never-failing lookup**: [`SingletonRegistry::get`] falls back to live host
//!   objects and finally creates one
//! - **Tracing support**: every registry and store accepts a callback receiving
//!   [`SingletonEvent`]s
//! - **Logging**: warnings and progress go through the `log` facade
//!
//! ## Cargo features
//!
//! - `tooling`: default for [`RegistryOptions::tooling`], enabling on-demand
//!   creation of missing persistent objects.

mod config;
mod facet;
mod hooks;
pub mod host;
mod macros;
mod object;
mod raw;
mod registry_error;
mod registry_event;
mod registry_trait;
mod resources;
pub mod shutdown;
mod storage;
mod template;
mod type_key;

pub use config::{ObjectEntry, RegistryConfig, RegistryOptions, ValidationIssue, DEFAULT_RESOURCE_ROOT};
pub use facet::{Facet, FacetState, Initialization, Listener, Singleton, SingletonBehaviour};
pub use hooks::{Disposer, Initializer, DISPOSER_ORDER, INITIALIZER_ORDER, USER_ORDER_MAX};
pub use object::SingletonObject;
pub use raw::{ProcessRegistry, RawSingleton, RawSingletonExt, PROCESS};
pub use registry_error::SingletonError;
pub use registry_event::{EntryList, ObjectSource, SingletonEvent};
pub use registry_trait::{RawRegistryApi, RawSlot, RawStorage, RawTraceSlot};
pub use resources::{ResourceFolder, ResourceLoader};
pub use storage::{SingletonRegistry, TraceCallback};
pub use template::Template;
pub use type_key::TypeKey;
