/// Which configured list a validation report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryList {
    /// Templates of behavioural singletons.
    Behaviours,
    /// Persistent-object singletons.
    Objects,
}

impl std::fmt::Display for EntryList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryList::Behaviours => f.write_str("behaviours"),
            EntryList::Objects => f.write_str("objects"),
        }
    }
}

/// Where a persistent-object singleton was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectSource {
    Cache,
    Configured,
    Resources,
    Created,
}

impl std::fmt::Display for ObjectSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectSource::Cache => f.write_str("cache"),
            ObjectSource::Configured => f.write_str("configured"),
            ObjectSource::Resources => f.write_str("resources"),
            ObjectSource::Created => f.write_str("created"),
        }
    }
}

/// Events emitted by the registries during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// Every warning the registry logs has a matching event, so callers can observe
/// misconfiguration without installing a logger.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::SingletonEvent;
///
/// let event = SingletonEvent::Register { type_name: "AudioManager" };
/// assert_eq!(event.to_string(), "register { type_name: AudioManager }");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SingletonEvent {
    /// An instance entered the live-instance table.
    Register { type_name: &'static str },

    /// An instance left the live-instance table.
    Unregister { type_name: &'static str },

    /// `initialize` was called on an instance that is already initialized.
    AlreadyInitialized { type_name: &'static str },

    /// `dispose` was called on an instance that is not initialized.
    NotInitialized { type_name: &'static str },

    /// A second instance of a type appeared and was destroyed.
    DuplicateDiscarded {
        type_name: &'static str,
        /// Scene holding the surviving instance.
        survivor_scene: String,
        /// Scene the discarded instance lived in.
        discarded_scene: String,
    },

    /// An empty slot was removed from the behaviour list.
    NullPruned { index: usize },

    /// The same entry appears more than once in a configured list.
    DuplicateEntry {
        list: EntryList,
        name: String,
        count: usize,
    },

    /// The same template was returned more than once by the resource scan.
    DuplicateResource { name: String },

    /// The startup spawn ran over this many templates.
    Spawn { templates: usize },

    /// No configured or live instance of the type was found.
    NotFound { type_name: &'static str },

    /// A new host object was created as last resort.
    AdHocCreated { type_name: &'static str },

    /// A persistent-object singleton was resolved.
    ObjectResolved {
        type_name: &'static str,
        source: ObjectSource,
    },

    /// A persistent-object singleton could not be resolved.
    ObjectMissing { type_name: &'static str },

    /// A plain-value singleton was created.
    RawCreate { type_name: &'static str },

    /// A plain-value singleton was disposed.
    RawDispose { type_name: &'static str },

    /// The registry was reset.
    Clear {},
}

impl std::fmt::Display for SingletonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SingletonEvent::Register { type_name } => {
                write!(f, "register {{ type_name: {} }}", type_name)
            }
            SingletonEvent::Unregister { type_name } => {
                write!(f, "unregister {{ type_name: {} }}", type_name)
            }
            SingletonEvent::AlreadyInitialized { type_name } => {
                write!(f, "already initialized {{ type_name: {} }}", type_name)
            }
            SingletonEvent::NotInitialized { type_name } => {
                write!(f, "not initialized {{ type_name: {} }}", type_name)
            }
            SingletonEvent::DuplicateDiscarded {
                type_name,
                survivor_scene,
                discarded_scene,
            } => write!(
                f,
                "duplicate discarded {{ type_name: {}, survivor: {}, discarded: {} }}",
                type_name, survivor_scene, discarded_scene
            ),
            SingletonEvent::NullPruned { index } => {
                write!(f, "null pruned {{ index: {} }}", index)
            }
            SingletonEvent::DuplicateEntry { list, name, count } => write!(
                f,
                "duplicate entry {{ list: {}, name: {}, count: {} }}",
                list, name, count
            ),
            SingletonEvent::DuplicateResource { name } => {
                write!(f, "duplicate resource {{ name: {} }}", name)
            }
            SingletonEvent::Spawn { templates } => {
                write!(f, "spawn {{ templates: {} }}", templates)
            }
            SingletonEvent::NotFound { type_name } => {
                write!(f, "not found {{ type_name: {} }}", type_name)
            }
            SingletonEvent::AdHocCreated { type_name } => {
                write!(f, "ad-hoc created {{ type_name: {} }}", type_name)
            }
            SingletonEvent::ObjectResolved { type_name, source } => write!(
                f,
                "object resolved {{ type_name: {}, source: {} }}",
                type_name, source
            ),
            SingletonEvent::ObjectMissing { type_name } => {
                write!(f, "object missing {{ type_name: {} }}", type_name)
            }
            SingletonEvent::RawCreate { type_name } => {
                write!(f, "raw create {{ type_name: {} }}", type_name)
            }
            SingletonEvent::RawDispose { type_name } => {
                write!(f, "raw dispose {{ type_name: {} }}", type_name)
            }
            SingletonEvent::Clear {} => write!(f, "Clearing the Registry"),
        }
    }
}

impl SingletonEvent {
    /// Whether the registry logs this event at warning level.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SingletonEvent::AlreadyInitialized { .. }
                | SingletonEvent::NotInitialized { .. }
                | SingletonEvent::DuplicateDiscarded { .. }
                | SingletonEvent::DuplicateEntry { .. }
                | SingletonEvent::DuplicateResource { .. }
                | SingletonEvent::AdHocCreated { .. }
                | SingletonEvent::ObjectMissing { .. }
        )
    }
}
