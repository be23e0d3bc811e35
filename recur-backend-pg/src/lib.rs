//! Postgres `Store` and RabbitMQ `Queue` backends for `recur-core`.
//!
//! This crate exists to demonstrate the "cloud-hosted KV table" /
//! "stream-broker backend" shape named in the design doc's scope note —
//! it is not meant to be the only, or even the recommended, production
//! pairing (a Postgres-fronted queue alongside a Postgres store would
//! avoid a second moving part for most deployments). Neither backend
//! here is exercised by this workspace's own test suite: both require a
//! live service to connect to, the same reason the teacher codebase
//! gates its own database-backed integration tests behind a running
//! Postgres instance rather than running them unconditionally.

mod queue;
mod store;

pub use queue::RabbitMqQueue;
pub use store::PgStore;
