use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// What a pending timer is for. Typing timers are per user within a
/// document; there is at most one save timer per document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Save,
    Typing(String),
}

type TimerKey = (String, TimerKind);

struct Entry {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TableInner {
    next_generation: u64,
    entries: HashMap<TimerKey, Entry>,
}

/// Scheduled-task table keyed by (document id, kind).
///
/// Scheduling a key that already holds a pending timer aborts the previous
/// task, so cancellation-on-superseding-event is a single operation instead
/// of ad hoc map bookkeeping.
#[derive(Clone, Default)]
pub struct TimerTable {
    inner: Arc<Mutex<TableInner>>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run after `delay`, replacing any pending timer
    /// for the same key.
    pub fn schedule<F>(&self, document_id: &str, kind: TimerKind, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key: TimerKey = (document_id.to_string(), kind);

        let generation = {
            let mut inner = self.inner.lock().unwrap();
            inner.next_generation += 1;
            inner.next_generation
        };

        let table = self.inner.clone();
        let cleanup_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
            // Only drop our own entry; a superseding timer may have
            // replaced it in the meantime.
            let mut inner = table.lock().unwrap();
            if inner
                .entries
                .get(&cleanup_key)
                .map(|e| e.generation == generation)
                .unwrap_or(false)
            {
                inner.entries.remove(&cleanup_key);
            }
        });

        let mut inner = self.inner.lock().unwrap();
        if let Some(old) = inner.entries.insert(key, Entry { generation, handle }) {
            trace!("Superseding pending timer");
            old.handle.abort();
        }
    }

    /// Cancel a pending timer. Returns whether one was pending.
    pub fn cancel(&self, document_id: &str, kind: &TimerKind) -> bool {
        let key: TimerKey = (document_id.to_string(), kind.clone());
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.remove(&key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of timers currently pending.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Number of pending save timers (documents with unflushed edits).
    pub fn pending_saves(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .entries
            .keys()
            .filter(|(_, kind)| *kind == TimerKind::Save)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn timer_fires_once_and_cleans_up() {
        let table = TimerTable::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        table.schedule("doc", TimerKind::Save, Duration::from_millis(20), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(table.pending(), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(table.pending(), 0);
    }

    #[tokio::test]
    async fn rescheduling_supersedes_pending_timer() {
        let table = TimerTable::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let f = fired.clone();
            table.schedule("doc", TimerKind::Save, Duration::from_millis(40), async move {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(table.pending(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_prevents_firing() {
        let table = TimerTable::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        table.schedule(
            "doc",
            TimerKind::Typing("u1".to_string()),
            Duration::from_millis(30),
            async move {
                f.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert!(table.cancel("doc", &TimerKind::Typing("u1".to_string())));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!table.cancel("doc", &TimerKind::Typing("u1".to_string())));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let table = TimerTable::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for kind in [TimerKind::Save, TimerKind::Typing("u1".to_string())] {
            let f = fired.clone();
            table.schedule("doc", kind, Duration::from_millis(20), async move {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(table.pending(), 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
