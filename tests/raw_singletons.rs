//! Integration tests for plain-value singletons and the shutdown hook.
//!
//! Every test here touches the process-wide shutdown list, so they run serially.

use serial_test::serial;
use singleton_lifecycle::{define_raw_registry, shutdown, RawSingleton, RawSingletonExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

static JOURNAL: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

fn journal() -> Vec<&'static str> {
    JOURNAL.lock().unwrap().clone()
}

fn reset() {
    shutdown::quit();
    JOURNAL.lock().unwrap().clear();
}

#[derive(Default)]
struct Analytics {
    sent: AtomicUsize,
}

impl RawSingleton for Analytics {
    fn on_init(&self) {
        JOURNAL.lock().unwrap().push("analytics:init");
    }

    fn on_deinit(&self) {
        JOURNAL.lock().unwrap().push("analytics:deinit");
    }
}

#[test]
#[serial]
fn test_created_lazily_once() {
    reset();
    assert!(!Analytics::is_alive());

    Analytics::instance().sent.fetch_add(1, Ordering::SeqCst);
    Analytics::instance().sent.fetch_add(1, Ordering::SeqCst);

    assert_eq!(Analytics::instance().sent.load(Ordering::SeqCst), 2);
    assert_eq!(journal(), vec!["analytics:init"]);
    reset();
}

#[test]
#[serial]
fn test_quit_disposes_and_notifies() {
    reset();
    Analytics::instance();
    let notified = Arc::new(AtomicUsize::new(0));
    let notified_clone = notified.clone();
    assert!(Analytics::subscribe_deinit(move || {
        notified_clone.fetch_add(1, Ordering::SeqCst);
    }));

    shutdown::quit();
    shutdown::quit();

    assert!(!Analytics::is_alive());
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(journal(), vec!["analytics:init", "analytics:deinit"]);
}

#[test]
#[serial]
fn test_explicit_dispose_unsubscribes() {
    reset();
    Analytics::instance();
    assert_eq!(shutdown::pending(), 1);

    assert!(Analytics::dispose());

    assert_eq!(shutdown::pending(), 0);
    shutdown::quit();
    assert_eq!(journal(), vec!["analytics:init", "analytics:deinit"]);
}

#[test]
#[serial]
fn test_access_after_quit_recreates() {
    reset();
    let before = Analytics::instance();
    shutdown::quit();

    let after = Analytics::instance();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(shutdown::pending(), 1);
    assert_eq!(
        journal(),
        vec!["analytics:init", "analytics:deinit", "analytics:init"]
    );
    reset();
}

#[test]
#[serial]
fn test_isolated_store_is_disposed_on_quit() {
    define_raw_registry!(tools);
    reset();

    tools::instance::<Analytics>();
    assert!(tools::contains::<Analytics>());
    assert!(!Analytics::is_alive());

    shutdown::quit();

    assert!(!tools::contains::<Analytics>());
    assert_eq!(journal(), vec!["analytics:init", "analytics:deinit"]);
}
