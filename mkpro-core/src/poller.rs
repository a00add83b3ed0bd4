//! Cancellable fixed-interval polling.
//!
//! A [`Poller`] runs a fetch on a tokio interval until a success predicate
//! holds, a tick cap or deadline is reached, or its [`PollHandle`] is stopped
//! or dropped. The task only fetches; results are sent over an mpsc channel
//! so the owner of the state applies them.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::MkproResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of fetches.
    pub max_ticks: Option<u32>,
    /// Wall-clock budget measured from spawn.
    pub deadline: Option<Duration>,
    /// Fetch right away instead of after the first interval.
    pub immediate: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_ticks: Some(20),
            deadline: None,
            immediate: false,
        }
    }
}

impl PollPolicy {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_ticks: None,
            deadline: None,
            immediate: false,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Satisfied { attempts: u32 },
    Exhausted { attempts: u32 },
    DeadlineElapsed,
    Cancelled,
}

impl PollOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollOutcome::Satisfied { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            PollOutcome::Satisfied { attempts } => format!("done after {} polls", attempts),
            PollOutcome::Exhausted { attempts } => format!("gave up after {} polls", attempts),
            PollOutcome::DeadlineElapsed => "timed out waiting".to_string(),
            PollOutcome::Cancelled => "stopped".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent<T> {
    Tick { attempt: u32, item: T },
    Failed { attempt: u32, message: String },
    Finished(PollOutcome),
}

pub type PollSender<T> = mpsc::UnboundedSender<PollEvent<T>>;
pub type PollReceiver<T> = mpsc::UnboundedReceiver<PollEvent<T>>;

pub fn poll_channel<T>() -> (PollSender<T>, PollReceiver<T>) {
    mpsc::unbounded_channel()
}

/// Handle to a running poll task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollHandle {
    running: Arc<AtomicBool>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait for the task to finish and return how it ended.
    pub async fn join(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct Poller;

impl Poller {
    /// Spawn a poll task on the current tokio runtime.
    pub fn spawn<T, F, Fut, D>(
        policy: PollPolicy,
        fetch: F,
        is_done: D,
        events: PollSender<T>,
    ) -> PollHandle
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = MkproResult<T>> + Send,
        D: Fn(&T) -> bool + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        debug!(
            "Starting poller: every {:?}, max_ticks={:?}, deadline={:?}",
            policy.interval, policy.max_ticks, policy.deadline
        );

        let task_running = running.clone();
        let task = tokio::spawn(async move {
            let outcome = poll_loop(policy, fetch, is_done, &events, shutdown_rx).await;
            task_running.store(false, Ordering::SeqCst);
            let _ = events.send(PollEvent::Finished(outcome));
            outcome
        });

        PollHandle {
            running,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn poll_loop<T, F, Fut, D>(
    policy: PollPolicy,
    mut fetch: F,
    is_done: D,
    events: &PollSender<T>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MkproResult<T>>,
    D: Fn(&T) -> bool,
{
    let started = Instant::now();
    let deadline = policy.deadline.map(|budget| started + budget);
    let first_tick = if policy.immediate {
        started
    } else {
        started + policy.interval
    };
    let mut ticker = interval_at(first_tick, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts = 0u32;
    loop {
        if let Some(max) = policy.max_ticks {
            if attempts >= max {
                info!("Poller exhausted after {} attempts", attempts);
                return PollOutcome::Exhausted { attempts };
            }
        }

        let deadline_reached = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                debug!("Poller stopped");
                return PollOutcome::Cancelled;
            }
            _ = deadline_reached => {
                info!("Poller deadline elapsed after {} attempts", attempts);
                return PollOutcome::DeadlineElapsed;
            }
            _ = ticker.tick() => {}
        }

        attempts += 1;
        let result = tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                debug!("Poller stopped during fetch");
                return PollOutcome::Cancelled;
            }
            result = fetch() => result,
        };

        match result {
            Ok(item) => {
                let done = is_done(&item);
                let _ = events.send(PollEvent::Tick {
                    attempt: attempts,
                    item,
                });
                if done {
                    info!("Poller satisfied after {} attempts", attempts);
                    return PollOutcome::Satisfied { attempts };
                }
            }
            Err(e) => {
                warn!("Poll attempt {} failed: {}", attempts, e);
                let _ = events.send(PollEvent::Failed {
                    attempt: attempts,
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MkproError;
    use std::sync::atomic::AtomicU32;

    fn counting_fetch(
        calls: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = MkproResult<u32>> + Send>> {
        move || {
            let calls = calls.clone();
            Box::pin(async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
        }
    }

    fn drain<T>(rx: &mut PollReceiver<T>) -> Vec<PollEvent<T>> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_predicate_holds() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = poll_channel();

        let handle = Poller::spawn(
            PollPolicy::default(),
            counting_fetch(calls.clone()),
            |n| *n == 3,
            tx,
        );

        assert_eq!(handle.join().await, PollOutcome::Satisfied { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], PollEvent::Tick { attempt: 3, item: 3 });
        assert_eq!(
            events[3],
            PollEvent::Finished(PollOutcome::Satisfied { attempts: 3 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_tick_cap() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, _rx) = poll_channel();

        let handle = Poller::spawn(
            PollPolicy::every(Duration::from_secs(3)).with_max_ticks(5),
            counting_fetch(calls.clone()),
            |_| false,
            tx,
        );

        assert_eq!(handle.join().await, PollOutcome::Exhausted { attempts: 5 });
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_with_immediate_first_fetch() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, _rx) = poll_channel();

        let handle = Poller::spawn(
            PollPolicy::every(Duration::from_secs(2))
                .immediate()
                .with_deadline(Duration::from_secs(5)),
            counting_fetch(calls.clone()),
            |_| false,
            tx,
        );

        assert_eq!(handle.join().await, PollOutcome::DeadlineElapsed);
        // Fetches at 0s, 2s and 4s.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = poll_channel();

        let mut handle = Poller::spawn(
            PollPolicy::default(),
            counting_fetch(calls.clone()),
            |_| false,
            tx,
        );
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(6500)).await;
        handle.stop();

        assert_eq!(handle.join().await, PollOutcome::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&PollEvent::Finished(PollOutcome::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_polling() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = poll_channel();
        let counter = calls.clone();

        let handle = Poller::spawn(
            PollPolicy::every(Duration::from_secs(1)).with_max_ticks(3),
            move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(MkproError::Network("connection refused".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| true,
            tx,
        );

        assert_eq!(handle.join().await, PollOutcome::Satisfied { attempts: 3 });
        let events = drain(&mut rx);
        assert!(matches!(
            &events[0],
            PollEvent::Failed { attempt: 1, message } if message == "connection refused"
        ));
        assert!(matches!(events[2], PollEvent::Tick { attempt: 3, item: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_task() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = poll_channel();

        let handle = Poller::spawn(
            PollPolicy::default(),
            counting_fetch(calls.clone()),
            |_| false,
            tx,
        );
        drop(handle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let events = drain(&mut rx);
        assert_eq!(events, vec![PollEvent::Finished(PollOutcome::Cancelled)]);
    }

    #[test]
    fn test_outcome_describe() {
        assert_eq!(
            PollOutcome::Exhausted { attempts: 20 }.describe(),
            "gave up after 20 polls"
        );
        assert!(PollOutcome::Satisfied { attempts: 1 }.is_satisfied());
    }
}
