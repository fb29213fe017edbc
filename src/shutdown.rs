//! Process-shutdown hook.
//!
//! Plain-value singletons subscribe here when they are created; [`quit`] runs
//! every subscribed callback once and empties the list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use log::debug;

/// Handle of a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuitToken(u64);

type QuitCallback = Arc<dyn Fn() + Send + Sync>;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

static CALLBACKS: LazyLock<Mutex<Vec<(QuitToken, QuitCallback)>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

/// Registers `callback` to run on [`quit`].
pub fn subscribe(callback: impl Fn() + Send + Sync + 'static) -> QuitToken {
    let token = QuitToken(NEXT_TOKEN.fetch_add(1, Ordering::SeqCst));
    CALLBACKS
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .push((token, Arc::new(callback)));
    token
}

/// Removes a subscription. Returns `false` if it already ran or was removed.
pub fn unsubscribe(token: QuitToken) -> bool {
    let mut callbacks = CALLBACKS.lock().unwrap_or_else(|p| p.into_inner());
    let before = callbacks.len();
    callbacks.retain(|(t, _)| *t != token);
    callbacks.len() != before
}

/// Signals process shutdown: runs each subscribed callback once, oldest first.
///
/// Callbacks may subscribe or unsubscribe; new subscriptions wait for the
/// next `quit`.
pub fn quit() {
    let callbacks = std::mem::take(&mut *CALLBACKS.lock().unwrap_or_else(|p| p.into_inner()));
    debug!("Running {} shutdown callbacks", callbacks.len());

    for (_, callback) in callbacks {
        callback();
    }
}

/// Number of callbacks waiting for [`quit`].
pub fn pending() -> usize {
    CALLBACKS.lock().unwrap_or_else(|p| p.into_inner()).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::AtomicUsize;

    #[test]
    #[serial]
    fn test_quit_runs_each_callback_once() {
        quit();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        subscribe(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(pending(), 1);
        quit();
        quit();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pending(), 0);
    }

    #[test]
    #[serial]
    fn test_unsubscribe() {
        quit();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let token = subscribe(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(unsubscribe(token));
        assert!(!unsubscribe(token));
        quit();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[serial]
    fn test_callback_may_resubscribe() {
        quit();
        subscribe(|| {
            subscribe(|| {});
        });

        quit();
        assert_eq!(pending(), 1);
        quit();
        assert_eq!(pending(), 0);
    }
}
