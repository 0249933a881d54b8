//! Single-resolution asynchronous operations.
//!
//! An operation moves through three provider phases, each run exactly once:
//!
//! 1. **do-work**: [`AsyncProvider::do_work`] starts the work on an
//!    executor thread and hands a [`Completer`] to whoever will finish it.
//! 2. **get-result**: once completed, [`AsyncProvider::get_result`] builds
//!    the output record, which is stored in the operation's result slot.
//! 3. **cleanup**: [`AsyncProvider::cleanup`] releases whatever the
//!    provider holds. It runs on every path, including failures.
//!
//! The caller-facing [`AsyncOp`] reads the slot once. The slot carries a
//! state tag (pending, completed, consumed) so misuse is reported as an
//! error instead of relying on call discipline.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::executor::{Executor, Job};
use crate::error::{Error, Result};

/// Work driven through the three-phase contract.
pub trait AsyncProvider: Send + Sized + 'static {
    /// Record produced when the operation completes.
    type Output: Send + 'static;

    /// Start the work. The operation completes when `completer` is
    /// completed or dropped. Returning `Err` fails the operation with that
    /// error, whatever happened to the completer.
    fn do_work(&mut self, completer: Completer) -> Result<()>;

    /// Build the output record for the final `status`.
    fn get_result(&mut self, status: &Result<()>) -> Self::Output;

    /// Release resources. Runs after the output is published.
    fn cleanup(self) {}
}

enum Slot<T> {
    Pending,
    Completed(T),
    Consumed,
}

struct OpShared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
    #[cfg(feature = "async-tokio")]
    notify: tokio::sync::Notify,
}

impl<T> OpShared<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Pending),
            ready: Condvar::new(),
            #[cfg(feature = "async-tokio")]
            notify: tokio::sync::Notify::new(),
        }
    }

    fn publish(&self, value: T) {
        {
            let mut slot = self.slot.lock();
            debug_assert!(matches!(*slot, Slot::Pending), "operation completed twice");
            *slot = Slot::Completed(value);
        }
        self.ready.notify_all();
        #[cfg(feature = "async-tokio")]
        self.notify.notify_waiters();
    }

    fn take(slot: &mut Slot<T>) -> Result<T> {
        match std::mem::replace(slot, Slot::Consumed) {
            Slot::Completed(value) => Ok(value),
            Slot::Pending => {
                *slot = Slot::Pending;
                Err(Error::OperationPending)
            }
            Slot::Consumed => Err(Error::ResultConsumed),
        }
    }
}

/// Caller's view of an asynchronous operation.
///
/// The result can be retrieved exactly once; later calls return
/// [`Error::ResultConsumed`].
pub struct AsyncOp<T> {
    shared: Arc<OpShared<T>>,
}

impl<T> AsyncOp<T> {
    /// Returns `true` once the operation has completed, whether or not the
    /// result has been retrieved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !matches!(*self.shared.slot.lock(), Slot::Pending)
    }

    /// Retrieve the result without waiting.
    ///
    /// # Errors
    ///
    /// - `Error::OperationPending` if the operation has not completed
    /// - `Error::ResultConsumed` if the result was already retrieved
    pub fn result(&self) -> Result<T> {
        OpShared::take(&mut self.shared.slot.lock())
    }

    /// Block the current thread until the operation completes, then
    /// retrieve the result.
    ///
    /// # Errors
    ///
    /// `Error::ResultConsumed` if the result was already retrieved.
    pub fn wait_blocking(&self) -> Result<T> {
        let mut slot = self.shared.slot.lock();
        while matches!(*slot, Slot::Pending) {
            self.shared.ready.wait(&mut slot);
        }
        OpShared::take(&mut slot)
    }

    /// Wait for completion without blocking the runtime, then retrieve the
    /// result.
    ///
    /// # Errors
    ///
    /// `Error::ResultConsumed` if the result was already retrieved.
    #[cfg(feature = "async-tokio")]
    pub async fn wait(&self) -> Result<T> {
        loop {
            let mut notified = std::pin::pin!(self.shared.notify.notified());
            notified.as_mut().enable();
            match self.result() {
                Err(Error::OperationPending) => notified.await,
                other => return other,
            }
        }
    }
}

impl<T> std::fmt::Debug for AsyncOp<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *self.shared.slot.lock() {
            Slot::Pending => "pending",
            Slot::Completed(_) => "completed",
            Slot::Consumed => "consumed",
        };
        f.debug_struct("AsyncOp").field("state", &state).finish()
    }
}

/// Completion side of an operation that has not been started yet.
pub(crate) struct OpSlot<T> {
    shared: Arc<OpShared<T>>,
}

/// Create a pending operation and its completion side.
pub(crate) fn pending<T>() -> (AsyncOp<T>, OpSlot<T>) {
    let shared = Arc::new(OpShared::new());
    (
        AsyncOp {
            shared: shared.clone(),
        },
        OpSlot { shared },
    )
}

/// One-shot completion signal handed to [`AsyncProvider::do_work`].
///
/// Dropping a completer without calling [`complete`](Self::complete) fails
/// the operation with `Error::Unexpected`, so an operation always reaches a
/// definite result.
pub struct Completer {
    finish: Option<Box<dyn FnOnce(Result<()>) + Send>>,
}

impl Completer {
    /// Complete the operation with `status`.
    pub fn complete(mut self, status: Result<()>) {
        if let Some(finish) = self.finish.take() {
            finish(status);
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if let Some(finish) = self.finish.take() {
            finish(Err(Error::Unexpected(
                "operation abandoned without completion".into(),
            )));
        }
    }
}

impl std::fmt::Debug for Completer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completer")
            .field("armed", &self.finish.is_some())
            .finish()
    }
}

enum Phase<P> {
    /// `do_work` is running; holds a completion that arrived early.
    Working(Option<Result<()>>),
    /// `do_work` returned; waiting for the completer.
    Waiting(P),
    Done,
}

struct Runner<P: AsyncProvider> {
    phase: Mutex<Phase<P>>,
    op: Arc<OpShared<P::Output>>,
}

impl<P: AsyncProvider> Runner<P> {
    fn run(self: Arc<Self>, mut provider: P) {
        let runner = self.clone();
        let completer = Completer {
            finish: Some(Box::new(move |status| runner.on_complete(status))),
        };
        let outcome = provider.do_work(completer);

        let mut phase = self.phase.lock();
        let status = match (outcome, &mut *phase) {
            (Err(err), _) => Some(Err(err)),
            (Ok(()), Phase::Working(early)) => early.take(),
            (Ok(()), _) => None,
        };
        match status {
            Some(status) => {
                *phase = Phase::Done;
                drop(phase);
                self.finalize(provider, status);
            }
            None => *phase = Phase::Waiting(provider),
        }
    }

    fn on_complete(&self, status: Result<()>) {
        let mut phase = self.phase.lock();
        match std::mem::replace(&mut *phase, Phase::Done) {
            Phase::Working(_) => *phase = Phase::Working(Some(status)),
            Phase::Waiting(provider) => {
                drop(phase);
                self.finalize(provider, status);
            }
            Phase::Done => {}
        }
    }

    fn finalize(&self, mut provider: P, status: Result<()>) {
        let output = provider.get_result(&status);
        self.op.publish(output);
        provider.cleanup();
    }
}

/// A scheduled provider. Dropping it before it runs completes the
/// operation with `Error::NotInitialized`.
struct PendingJob<P: AsyncProvider> {
    runner: Arc<Runner<P>>,
    cell: Arc<Mutex<Option<P>>>,
}

impl<P: AsyncProvider> PendingJob<P> {
    fn run(self) {
        let provider = self.cell.lock().take();
        if let Some(provider) = provider {
            self.runner.clone().run(provider);
        }
    }
}

impl<P: AsyncProvider> Drop for PendingJob<P> {
    fn drop(&mut self) {
        let provider = self.cell.lock().take();
        if let Some(provider) = provider {
            *self.runner.phase.lock() = Phase::Done;
            self.runner.finalize(
                provider,
                Err(Error::NotInitialized("executor dropped the job before it ran".into())),
            );
        }
    }
}

/// Schedule `provider` on `executor`, bound to `slot`.
///
/// If the executor refuses the job, the operation is completed with the
/// executor's error (running get-result and cleanup) and the error is
/// returned. A job the executor accepts but drops without running fails
/// the operation with `Error::NotInitialized`.
pub(crate) fn start<P: AsyncProvider>(
    slot: OpSlot<P::Output>,
    provider: P,
    executor: &dyn Executor,
) -> Result<()> {
    let runner = Arc::new(Runner {
        phase: Mutex::new(Phase::Working(None)),
        op: slot.shared,
    });
    let cell = Arc::new(Mutex::new(Some(provider)));

    let pending = PendingJob {
        runner: runner.clone(),
        cell: cell.clone(),
    };
    let job: Job = Box::new(move || pending.run());

    if let Err(err) = executor.execute(job) {
        let provider = cell.lock().take();
        if let Some(provider) = provider {
            *runner.phase.lock() = Phase::Done;
            runner.finalize(provider, Err(err.clone()));
        }
        return Err(err);
    }
    Ok(())
}

/// Create an operation for `provider` and schedule it.
pub(crate) fn begin<P: AsyncProvider>(
    provider: P,
    executor: &dyn Executor,
) -> Result<AsyncOp<P::Output>> {
    let (op, slot) = pending();
    start(slot, provider, executor)?;
    Ok(op)
}
