//! Executors that run the do-work phase of operations.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::Result;

/// A unit of work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs. Implementations must run every accepted job exactly once.
pub trait Executor: Send + Sync + 'static {
    /// Accept `job` for execution.
    ///
    /// # Errors
    ///
    /// `Error::NotInitialized` if the executor cannot accept work.
    fn execute(&self, job: Job) -> Result<()>;
}

thread_local! {
    static TRAMPOLINE: RefCell<Option<VecDeque<Job>>> = const { RefCell::new(None) };
}

/// Clears the trampoline even if a job panics.
struct TrampolineGuard;

impl Drop for TrampolineGuard {
    fn drop(&mut self) {
        TRAMPOLINE.with(|t| *t.borrow_mut() = None);
    }
}

/// Runs jobs on the calling thread.
///
/// A job submitted while another inline job is running on the same thread
/// is queued and run after it returns, so chains of completions that each
/// schedule the next step run in a loop instead of growing the stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) -> Result<()> {
        let first = TRAMPOLINE.with(|t| {
            let mut t = t.borrow_mut();
            match t.as_mut() {
                Some(queue) => {
                    queue.push_back(job);
                    None
                }
                None => {
                    *t = Some(VecDeque::new());
                    Some(job)
                }
            }
        });
        let Some(first) = first else {
            return Ok(());
        };

        let _guard = TrampolineGuard;
        first();
        while let Some(next) = TRAMPOLINE.with(|t| t.borrow_mut().as_mut().and_then(VecDeque::pop_front)) {
            next();
        }
        Ok(())
    }
}

/// Spawns jobs onto a tokio runtime.
///
/// Once the runtime shuts down, spawned jobs are dropped unrun and the
/// operation each one carries fails with `Error::NotInitialized`.
#[cfg(feature = "async-tokio")]
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async-tokio")]
impl TokioExecutor {
    /// Executor spawning onto `handle`.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Executor for the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// `Error::NotInitialized` when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| crate::Error::NotInitialized(e.to_string()))
    }
}

#[cfg(feature = "async-tokio")]
impl Executor for TokioExecutor {
    fn execute(&self, job: Job) -> Result<()> {
        self.handle.spawn(async move { job() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_inline_runs_immediately() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        InlineExecutor
            .execute(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inline_nested_jobs_run_after_parent() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let outer = order.clone();
        InlineExecutor
            .execute(Box::new(move || {
                let inner = outer.clone();
                InlineExecutor
                    .execute(Box::new(move || inner.lock().unwrap().push("child")))
                    .unwrap();
                outer.lock().unwrap().push("parent");
            }))
            .unwrap();
        assert_eq!(*order.lock().unwrap(), ["parent", "child"]);
    }

    fn chain(remaining: usize, depth: Arc<AtomicUsize>, max_depth: Arc<AtomicUsize>) {
        let now = depth.fetch_add(1, Ordering::SeqCst) + 1;
        max_depth.fetch_max(now, Ordering::SeqCst);
        if remaining > 0 {
            let (d, m) = (depth.clone(), max_depth.clone());
            InlineExecutor
                .execute(Box::new(move || chain(remaining - 1, d, m)))
                .unwrap();
        }
        depth.fetch_sub(1, Ordering::SeqCst);
    }

    #[test]
    fn test_inline_chain_does_not_recurse() {
        let depth = Arc::new(AtomicUsize::new(0));
        let max_depth = Arc::new(AtomicUsize::new(0));
        let (d, m) = (depth.clone(), max_depth.clone());
        InlineExecutor
            .execute(Box::new(move || chain(10_000, d, m)))
            .unwrap();
        assert_eq!(max_depth.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inline_recovers_after_panic() {
        let result = std::panic::catch_unwind(|| {
            InlineExecutor
                .execute(Box::new(|| panic!("job failed")))
                .unwrap();
        });
        assert!(result.is_err());

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        InlineExecutor
            .execute(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[cfg(feature = "async-tokio")]
    #[test]
    fn test_tokio_current_outside_runtime() {
        assert!(matches!(
            TokioExecutor::current(),
            Err(crate::Error::NotInitialized(_))
        ));
    }

    #[cfg(feature = "async-tokio")]
    #[tokio::test]
    async fn test_tokio_executor_runs_job() {
        let executor = TokioExecutor::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        executor
            .execute(Box::new(move || {
                let _ = tx.send(7);
            }))
            .unwrap();
        assert_eq!(rx.await.unwrap(), 7);
    }
}
