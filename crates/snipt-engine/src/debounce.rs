use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Slot = Arc<Mutex<Option<(u64, JoinHandle<()>)>>>;

/// Runs only the last of a burst of triggers, once `delay` has passed
/// without a newer one. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Slot,
    next_id: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Schedule `task`, replacing whatever was pending
    pub fn trigger<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);

        // the slot stays locked until the new handle is stored, so the task
        // cannot look for itself before it is there
        let mut slot = self.pending.lock();
        if let Some((_, previous)) = slot.take() {
            previous.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = pending.lock();
                match slot.as_ref() {
                    Some((current, _)) if *current == id => {
                        // once running, cancel() no longer reaches this task
                        slot.take();
                    }
                    _ => return,
                }
            }
            task().await;
        });
        *slot = Some((id, handle));
    }

    /// Drop the pending task, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        let make = move || -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> {
            let shared = Arc::clone(&shared);
            Box::pin(async move {
                shared.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn collapses_a_burst_into_one_run() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let (count, make) = counter();

        for _ in 0..5 {
            let task = make();
            debouncer.trigger(move || task);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert!(debouncer.is_pending());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_run() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let (count, make) = counter();

        let task = make();
        debouncer.trigger(move || task);
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
