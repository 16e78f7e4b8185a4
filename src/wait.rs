//! Fixed-interval poll loop with deadline and cancellation

use crate::Result;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
    Cancelled,
}

impl WaitOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied => f.write_str("satisfied"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Condition observed on a poll that did not satisfy the wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    RunningCount { current: usize, desired: usize },
    ContainersNotReady,
}

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Ready,
    NotYet(Pending),
}

#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Probe until the condition holds, the deadline passes or the token is
    /// cancelled. The first probe runs immediately. A probe error ends the
    /// loop and is returned as-is.
    pub async fn poll_until<P, Fut, F>(&self, mut probe: P, mut on_pending: F) -> Result<WaitOutcome>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<Check>>,
        F: FnMut(&Pending),
    {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut attempt = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                warn!("Wait cancelled after {} polls", attempt);
                return Ok(WaitOutcome::Cancelled);
            }

            attempt += 1;
            let check = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!("Wait cancelled during poll {}", attempt);
                    return Ok(WaitOutcome::Cancelled);
                }
                _ = until(deadline) => {
                    warn!("Wait timed out during poll {}", attempt);
                    return Ok(WaitOutcome::TimedOut);
                }
                check = probe() => check?,
            };

            let pending = match check {
                Check::Ready => {
                    debug!("Condition met on poll {}", attempt);
                    return Ok(WaitOutcome::Satisfied);
                }
                Check::NotYet(pending) => pending,
            };

            debug!("Poll {} not satisfied: {:?}", attempt, pending);
            on_pending(&pending);

            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!("Wait timed out after {} polls", attempt);
                return Ok(WaitOutcome::TimedOut);
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!("Wait cancelled after {} polls", attempt);
                    return Ok(WaitOutcome::Cancelled);
                }
                _ = until(deadline) => {
                    warn!("Wait timed out after {} polls", attempt);
                    return Ok(WaitOutcome::TimedOut);
                }
                _ = sleep(self.interval) => {}
            }
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POLL_INTERVAL)
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(d).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PodSetError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_on_third_poll() {
        let polls = AtomicUsize::new(0);
        let polls = &polls;
        let mut reports = Vec::new();
        let start = Instant::now();

        let outcome = Poller::new(Duration::from_secs(5))
            .poll_until(
                move || async move {
                    let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n >= 3 {
                        Ok(Check::Ready)
                    } else {
                        Ok(Check::NotYet(Pending::ContainersNotReady))
                    }
                },
                |p| reports.push(p.clone()),
            )
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(reports.len(), 2);
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let polls = AtomicUsize::new(0);
        let polls = &polls;

        let outcome = Poller::new(Duration::from_secs(5))
            .with_timeout(Some(Duration::from_secs(12)))
            .poll_until(
                move || async move {
                    polls.fetch_add(1, Ordering::SeqCst);
                    Ok(Check::NotYet(Pending::ContainersNotReady))
                },
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut);
        // polls at t=0, 5 and 10; the deadline at 12 fires during the next sleep
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cuts_slow_poll_short() {
        let start = Instant::now();

        let outcome = Poller::new(Duration::from_secs(5))
            .with_timeout(Some(Duration::from_secs(10)))
            .poll_until(
                || async {
                    sleep(Duration::from_secs(60)).await;
                    Ok(Check::Ready)
                },
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_sleep() {
        let cancel = CancellationToken::new();
        let poller = Poller::new(Duration::from_secs(5)).with_cancellation(cancel.clone());
        let polls = Arc::new(AtomicUsize::new(0));

        let task = {
            let polls = polls.clone();
            tokio::spawn(async move {
                poller
                    .poll_until(
                        || {
                            let polls = polls.clone();
                            async move {
                                polls.fetch_add(1, Ordering::SeqCst);
                                Ok(Check::NotYet(Pending::ContainersNotReady))
                            }
                        },
                        |_| {},
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(7)).await;
        cancel.cancel();

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_polls() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let polls = AtomicUsize::new(0);
        let polls = &polls;

        let outcome = Poller::default()
            .with_cancellation(cancel)
            .poll_until(
                move || async move {
                    polls.fetch_add(1, Ordering::SeqCst);
                    Ok(Check::Ready)
                },
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let result = Poller::default()
            .poll_until(
                || async { Err(PodSetError::KubernetesError("connection refused".to_string())) },
                |_| {},
            )
            .await;

        assert!(matches!(result, Err(PodSetError::KubernetesError(_))));
    }
}
