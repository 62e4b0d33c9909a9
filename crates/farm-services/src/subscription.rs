//! Cancellation handles for standing queries.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::debug;

thread_local! {
    /// Address of the delivery gate whose callback is running on this thread.
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

/// A live registration delivering values to a callback.
///
/// [`unsubscribe`](Self::unsubscribe) stops delivery: once it returns, the
/// callback is not running and is never invoked again. It may be called any
/// number of times, including from inside the callback. Dropping a
/// `Subscription` does NOT stop delivery; a registration that is never
/// unsubscribed lives as long as its source stream.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

struct Inner {
    active: Arc<AtomicBool>,
    /// Held for the whole check-and-invoke of every delivery.
    gate: Arc<Mutex<()>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    /// Run `task` in the background. The task receives the shared active
    /// flag and must stop doing observable work once it reads `false`.
    pub(crate) fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(task(Arc::clone(&active)));
        Self::from_task(active, Arc::new(Mutex::new(())), handle)
    }

    /// Feed every item of `stream` to `on_change`, in order.
    pub(crate) fn for_each<S, T, F>(stream: S, mut on_change: F) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let gate = Arc::new(Mutex::new(()));

        let task_active = Arc::clone(&active);
        let task_gate = Arc::clone(&gate);
        let handle = tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            while let Some(item) = stream.next().await {
                let _guard = lock(&task_gate);
                if !task_active.load(Ordering::SeqCst) {
                    return;
                }
                let _marker = Delivering::enter(&task_gate);
                on_change(item);
            }
            task_active.store(false, Ordering::SeqCst);
        });

        Self::from_task(active, gate, handle)
    }

    fn from_task(active: Arc<AtomicBool>, gate: Arc<Mutex<()>>, handle: JoinHandle<()>) -> Self {
        Self {
            inner: Arc::new(Inner {
                active,
                gate,
                task: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Stop delivery, waiting out a callback that is already running on
    /// another thread. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        let was_active = self.inner.active.swap(false, Ordering::SeqCst);

        // Called from our own callback: the gate is already held here.
        if !Delivering::is_current(&self.inner.gate) {
            drop(lock(&self.inner.gate));
        }

        if !was_active {
            return;
        }

        let handle = lock(&self.inner.task).take();
        if let Some(handle) = handle {
            handle.abort();
        }
        debug!("Subscription detached");
    }

    /// Whether values may still be delivered.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }
}

/// A panicking callback poisons the gate; delivery has stopped either way.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Marks the current thread as inside the callback guarded by a gate.
struct Delivering {
    previous: usize,
}

impl Delivering {
    fn enter(gate: &Arc<Mutex<()>>) -> Self {
        let previous = DELIVERING.with(|d| d.replace(Arc::as_ptr(gate) as usize));
        Self { previous }
    }

    fn is_current(gate: &Arc<Mutex<()>>) -> bool {
        DELIVERING.with(|d| d.get()) == Arc::as_ptr(gate) as usize
    }
}

impl Drop for Delivering {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(self.previous));
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = Subscription::for_each(stream::iter(vec![1, 2, 3]), move |n| {
            let _ = tx.send(n);
        });

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel::<u32>();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = tokio_stream_from(feed_rx);

        let subscription = Subscription::for_each(feed, move |n| {
            let _ = tx.send(n);
        });

        feed_tx.send(1).unwrap();
        assert_eq!(rx.recv().await, Some(1));

        subscription.unsubscribe();
        assert!(!subscription.is_active());
        let _ = feed_tx.send(2);

        // The callback (and the sender it owns) is dropped with the task.
        let next = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(next, Ok(None));
    }

    #[tokio::test]
    async fn test_unsubscribe_twice() {
        let subscription = Subscription::for_each(stream::pending::<()>(), |_| {});
        assert!(subscription.is_active());
        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_finished_stream_is_inactive() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = Subscription::for_each(stream::iter(vec![()]), move |_| {
            let _ = tx.send(());
        });
        assert_eq!(rx.recv().await, Some(()));
        // Sender dropped once the task returns.
        assert_eq!(rx.recv().await, None);
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_unsubscribe_from_inside_callback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let callback_slot = Arc::clone(&slot);
        let (feed_tx, feed_rx) = mpsc::unbounded_channel::<u32>();

        let subscription = Subscription::for_each(tokio_stream_from(feed_rx), move |n| {
            let _ = tx.send(n);
            if let Some(subscription) = callback_slot.lock().unwrap().as_ref() {
                subscription.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(subscription.clone());

        feed_tx.send(1).unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert!(!subscription.is_active());

        let _ = feed_tx.send(2);
        let next = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(next, Ok(None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_callback_running_after_unsubscribe_returns() {
        use std::sync::atomic::AtomicUsize;

        for _ in 0..200 {
            let delivered = Arc::new(AtomicUsize::new(0));
            let detached = Arc::new(AtomicBool::new(false));
            let late = Arc::new(AtomicBool::new(false));

            let (cb_delivered, cb_detached, cb_late) =
                (Arc::clone(&delivered), Arc::clone(&detached), Arc::clone(&late));
            let subscription = Subscription::for_each(stream::repeat(()), move |_| {
                if cb_detached.load(Ordering::SeqCst) {
                    cb_late.store(true, Ordering::SeqCst);
                }
                cb_delivered.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_micros(20));
                if cb_detached.load(Ordering::SeqCst) {
                    cb_late.store(true, Ordering::SeqCst);
                }
            });

            while delivered.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            subscription.unsubscribe();
            detached.store(true, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(!late.load(Ordering::SeqCst), "callback ran after unsubscribe returned");
        }
    }

    fn tokio_stream_from<T: Send + 'static>(
        mut rx: mpsc::UnboundedReceiver<T>,
    ) -> impl Stream<Item = T> + Send + 'static {
        stream::poll_fn(move |cx| rx.poll_recv(cx))
    }
}
