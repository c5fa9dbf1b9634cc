// ── Single-flight submit guard ──
//
// A form's submit button is disabled while its request is pending. The
// guard is the non-visual half of that: while one submission runs, any
// further submission is refused without running its future.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<T> {
    Completed(T),
    /// Another submission was already in flight.
    Busy,
}

impl<T> SubmitOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Busy => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SubmitGuard {
    busy: AtomicBool,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a new submission would be accepted.
    pub fn is_enabled(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Run `submission` unless one is already running. The guard
    /// re-enables when `submission` settles, whatever its result, or
    /// when the returned future is dropped.
    pub async fn run<F: Future>(&self, submission: F) -> SubmitOutcome<F::Output> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("submission ignored while another is pending");
            return SubmitOutcome::Busy;
        }
        let _release = Release(&self.busy);
        SubmitOutcome::Completed(submission.await)
    }
}

struct Release<'a>(&'a AtomicBool);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn second_submission_is_refused_while_first_runs() {
        let guard = SubmitGuard::new();
        let runs = AtomicUsize::new(0);
        let (tx, rx) = oneshot::channel::<()>();

        let first = guard.run(async {
            runs.fetch_add(1, Ordering::SeqCst);
            let _ = rx.await;
            "done"
        });
        let second = async {
            assert!(!guard.is_enabled());
            let outcome = guard
                .run(async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    "again"
                })
                .await;
            let _ = tx.send(());
            outcome
        };

        let (a, b) = futures::join!(first, second);
        assert_eq!(a, SubmitOutcome::Completed("done"));
        assert_eq!(b, SubmitOutcome::Busy);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(guard.is_enabled());
    }

    #[tokio::test]
    async fn failure_re_enables() {
        let guard = SubmitGuard::new();
        let outcome = guard.run(async { Err::<(), _>("boom") }).await;
        assert_eq!(outcome, SubmitOutcome::Completed(Err("boom")));
        assert!(guard.is_enabled());
    }
}
