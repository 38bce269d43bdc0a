//! # Invdes Compute
//!
//! Batch dispatch of independent solver jobs. Callers hand a named batch to a
//! [`BatchDispatcher`](dispatch::BatchDispatcher) and block until every job
//! has finished; [`dispatch_ordered`](dispatch::dispatch_ordered) then returns
//! the results in submission order regardless of completion order.
//!
//! ## Available dispatchers
//!
//! | Dispatcher | Feature flag | Execution |
//! |------------|-------------|-----------|
//! | [`LocalDispatcher`] | always | Sequential, in the calling thread |
//! | [`ThreadPoolDispatcher`] | `parallel` (default) | Rayon thread pool |
//!
//! Job names come from a [`TaskNamer`] owned by the caller, so concurrent
//! runs never share a counter.

pub mod dispatch;
pub mod local;
pub mod naming;

#[cfg(feature = "parallel")]
pub mod pool;

pub use dispatch::{dispatch_ordered, BatchDispatcher, DispatchError};
pub use local::LocalDispatcher;
pub use naming::TaskNamer;

#[cfg(feature = "parallel")]
pub use pool::ThreadPoolDispatcher;
