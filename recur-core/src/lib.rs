//! The deferred-execution runtime: the algorithm that turns a recursive
//! async function invocation into a dataflow graph of memoized
//! subcomputations, coordinates at-most-one-in-flight scheduling per
//! subcomputation via compare-and-swap on a shared store, and wakes
//! waiting parents when children complete.
//!
//! This crate is the core only — concrete [`Store`], [`Queue`], and
//! [`Codec`] backends live in sibling crates (`recur-backend-memory`,
//! `recur-backend-pg`, `recur-codec-json`).

mod cache;
mod codec;
mod config;
mod error;
mod gather;
mod logging;
mod memory;
mod model;
mod queue;
mod records;
mod registry;
mod runtime;
mod store;
mod worker;

pub use cache::Cache;
pub use codec::Codec;
pub use config::RunnerConfig;
pub use error::RecurError;
pub use gather::gather;
pub use logging::init_tracing;
pub use memory::Memory;
pub use model::{Call, StoreKey};
pub use queue::{Queue, QueueInfo, QueueMessage};
pub use registry::{CallableProxy, TaskContext, TaskRegistry};
pub use runtime::{Recur, RecurBuilder};
pub use store::Store;
