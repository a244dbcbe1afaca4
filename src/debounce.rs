use std::time::Duration;

use log::{trace, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Trailing-edge debounce: runs the most recently scheduled action once the
/// delay has passed with no further scheduling.
///
/// Each instance owns at most one pending task. Scheduling cancels the
/// pending one before spawning its replacement, and dropping the debouncer
/// cancels whatever is still waiting.
pub struct Debouncer {
    delay: Duration,
    pending: Option<PendingTask>,
}

struct PendingTask {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` to run after the quiet period, replacing anything
    /// already pending.
    ///
    /// Must be called from within a tokio runtime for the delay to apply.
    /// Without one the action runs immediately.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available - running debounced action immediately");
                action();
                return;
            }
        };

        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let delay = self.delay;

        trace!("Debounce scheduled ({} ms)", delay.as_millis());

        let handle = handle.spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    trace!("Debounced action cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    action();
                }
            }
        });

        self.pending = Some(PendingTask {
            cancel_token,
            handle,
        });
    }

    /// Cancel the pending action, if any. Returns true if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(task) => {
                let was_waiting = !task.handle.is_finished();
                task.cancel_token.cancel();
                was_waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished() && !task.cancel_token.is_cancelled())
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
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce() + Send>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let make = move |label: &'static str| {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().unwrap().push(label)) as Box<dyn FnOnce() + Send>
        };
        (fired, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_action_fires() {
        let (fired, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(make("a"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(make("ab"));
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(fired.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*fired.lock().unwrap(), vec!["ab"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_periods_fire_each_time() {
        let (fired, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(make("first"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.schedule(make("second"));
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*fired.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let (fired, make) = recorder();

        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule(make("cancelled"));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        let mut dropped = Debouncer::new(Duration::from_millis(300));
        dropped.schedule(make("dropped"));
        drop(dropped);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[test]
    fn test_without_runtime_runs_immediately() {
        let (fired, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(make("now"));

        assert_eq!(*fired.lock().unwrap(), vec!["now"]);
        assert!(!debouncer.is_pending());
    }
}
