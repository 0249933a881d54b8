//! Three-phase asynchronous operations and the executors that drive them.
//!
//! Every session operation that does not finish on the caller's thread is
//! an [`AsyncOp`]: the caller gets a handle immediately, the work runs on an
//! [`Executor`], and the result is published once into the handle's slot.

mod executor;
mod op;

#[cfg(feature = "async-tokio")]
pub use executor::TokioExecutor;
pub use executor::{Executor, InlineExecutor, Job};
pub use op::{AsyncOp, AsyncProvider, Completer};

pub(crate) use op::{OpSlot, begin, pending, start};
