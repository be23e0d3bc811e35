//! Shared harness for the root crate's end-to-end scenario tests.
//!
//! Every scenario wires its own [`recur_core::RecurBuilder`] (different
//! tasks, different call shapes) but all of them need the same two
//! things: a place to count how many times a handler actually ran, and a
//! way to drive `wrrrk` to completion against a queue nothing else will
//! ever close.
//!
//! Not every scenario uses every item here (e.g. the error-propagation
//! scenario has no need for `Counters`), which would otherwise trip
//! `dead_code` once each test binary compiles this module on its own.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use recur_backend_memory::InMemoryQueue;
use recur_core::{Recur, RecurError};

/// Per-key invocation counters, bumped from inside task handlers.
///
/// Cloning shares the same underlying map — cheap, `Arc`-backed, safe to
/// stash one clone per handler closure.
#[derive(Clone, Default, Debug)]
pub struct Counters(Arc<Mutex<HashMap<String, u64>>>);

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one invocation under `key`, returning the new count.
    pub fn bump(&self, key: impl Into<String>) -> u64 {
        let mut counts = self.0.lock().unwrap();
        let entry = counts.entry(key.into()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn get(&self, key: &str) -> u64 {
        *self.0.lock().unwrap().get(key).unwrap_or(&0)
    }
}

/// Drives `recur`'s worker loop to quiescence against an in-memory queue
/// that nothing else will close: polls queue depth in the background and
/// closes it once two consecutive checks, 20ms apart, see it empty.
/// Mirrors `recur-cli`'s `schedule` subcommand watchdog.
pub async fn drain_to_quiescence(recur: Arc<Recur>, queue: Arc<InMemoryQueue>) -> Result<(), RecurError> {
    let watchdog_queue = queue.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let Ok(info) = watchdog_queue.get_info().await else {
                break;
            };
            if info.num_messages == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if matches!(watchdog_queue.get_info().await, Ok(i) if i.num_messages == 0) {
                    watchdog_queue.close();
                    break;
                }
            }
        }
    });
    recur.wrrrk().await
}
