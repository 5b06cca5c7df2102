//! Fire-and-forget dispatch onto the thread that owns UI state.

use std::fmt;

use tokio::sync::mpsc;

/// A job run against the UI-owned state `S`.
pub type UiJob<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Create a connected dispatcher/loop pair for state `S`.
#[must_use]
pub fn ui_channel<S: 'static>() -> (UiDispatcher<S>, UiLoop<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiDispatcher { tx }, UiLoop { rx })
}

/// Posts jobs to the UI thread from any thread.
pub struct UiDispatcher<S> {
    tx: mpsc::UnboundedSender<UiJob<S>>,
}

impl<S> Clone for UiDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> fmt::Debug for UiDispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<S: 'static> UiDispatcher<S> {
    /// Queue `job` to run on the UI thread. Never waits for it.
    ///
    /// Returns `false` (and drops the job) when the UI loop no longer exists.
    pub fn post(&self, job: impl FnOnce(&mut S) + Send + 'static) -> bool {
        if self.tx.send(Box::new(job)).is_err() {
            tracing::debug!("UI loop closed; job dropped");
            return false;
        }
        true
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// UI-thread end of the dispatch queue. Jobs run in submission order.
pub struct UiLoop<S> {
    rx: mpsc::UnboundedReceiver<UiJob<S>>,
}

impl<S> fmt::Debug for UiLoop<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiLoop").finish_non_exhaustive()
    }
}

impl<S> UiLoop<S> {
    /// Run every job already queued. Returns how many ran.
    pub fn run_pending(&mut self, state: &mut S) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            job(state);
            count += 1;
        }
        count
    }

    /// Run jobs as they arrive until every dispatcher is dropped.
    ///
    /// Blocks the calling thread; must not be called from inside an async runtime.
    pub fn run(&mut self, state: &mut S) -> usize {
        let mut count = 0;
        while let Some(job) = self.rx.blocking_recv() {
            job(state);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_jobs_run_in_submission_order() {
        let (dispatcher, mut ui) = ui_channel::<Vec<u32>>();
        for i in 0..5 {
            assert!(dispatcher.post(move |log: &mut Vec<u32>| log.push(i)));
        }

        let mut log = Vec::new();
        assert_eq!(ui.run_pending(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert_eq!(ui.run_pending(&mut log), 0);
    }

    #[test]
    fn test_post_does_not_run_job_inline() {
        let (dispatcher, mut ui) = ui_channel::<u32>();
        let mut state = 0;
        dispatcher.post(|n: &mut u32| *n += 1);
        assert_eq!(state, 0);
        ui.run_pending(&mut state);
        assert_eq!(state, 1);
    }

    #[test]
    fn test_post_after_loop_dropped_is_noop() {
        let (dispatcher, ui) = ui_channel::<u32>();
        drop(ui);
        assert!(dispatcher.is_closed());
        assert!(!dispatcher.post(|n: &mut u32| *n += 1));
    }

    #[test]
    fn test_run_on_owning_thread() {
        let (dispatcher, mut ui) = ui_channel::<Vec<thread::ThreadId>>();
        let owner = thread::spawn(move || {
            let mut seen = Vec::new();
            ui.run(&mut seen);
            (thread::current().id(), seen)
        });

        let posters: Vec<_> = (0..3)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                thread::spawn(move || {
                    dispatcher.post(|seen: &mut Vec<thread::ThreadId>| {
                        seen.push(thread::current().id());
                    });
                })
            })
            .collect();
        for poster in posters {
            poster.join().unwrap();
        }
        drop(dispatcher);

        let (owner_id, seen) = owner.join().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|id| *id == owner_id));
    }
}
