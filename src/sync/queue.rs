// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deduplicating work queue feeding the reconcile workers.
//!
//! A key waits in the queue at most once. While a worker holds a key, adding
//! it again only marks it dirty; it is queued again when the worker calls
//! [`WorkQueue::done`]. The same key is therefore never processed by two
//! workers at the same time.
//!
//! Delayed adds go through the kube-runtime scheduler, which keeps at most one
//! pending retry per key. [`WorkQueue::run_retries`] drives it until shutdown.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use kube_runtime::scheduler::{scheduler, ScheduleRequest};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::pin::pin;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

struct QueueState<K> {
    queue: VecDeque<K>,
    /// Keys waiting to be processed, queued or not
    dirty: HashSet<K>,
    /// Keys currently held by a worker
    processing: HashSet<K>,
    shutting_down: bool,
}

pub struct WorkQueue<K> {
    state: Mutex<QueueState<K>>,
    notify: Notify,
    retry_tx: UnboundedSender<ScheduleRequest<K>>,
    /// Taken by the single retry driver
    retry_rx: Mutex<Option<UnboundedReceiver<ScheduleRequest<K>>>>,
    /// Signalled once on shutdown to stop the retry driver
    closed: Notify,
}

impl<K> Default for WorkQueue<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> WorkQueue<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    pub fn new() -> Self {
        let (retry_tx, retry_rx) = mpsc::unbounded();
        Self {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                dirty: HashSet::new(),
                processing: HashSet::new(),
                shutting_down: false,
            }),
            notify: Notify::new(),
            retry_tx,
            retry_rx: Mutex::new(Some(retry_rx)),
            closed: Notify::new(),
        }
    }

    pub fn add(&self, key: K) {
        {
            let mut state = self.state.lock();
            if state.shutting_down || !state.dirty.insert(key.clone()) {
                return;
            }
            if state.processing.contains(&key) {
                return;
            }
            state.queue.push_back(key);
        }
        self.notify.notify_one();
    }

    /// Add `key` once `delay` has elapsed. A key already waiting for a retry
    /// keeps the earlier deadline. Requires [`WorkQueue::run_retries`] to be running.
    pub fn add_after(&self, key: K, delay: Duration) {
        let request = ScheduleRequest {
            message: key,
            run_at: Instant::now() + delay,
        };
        // fails only once the driver is gone, after shutdown
        let _ = self.retry_tx.unbounded_send(request);
    }

    /// Move delayed keys into the queue as they come due. Returns on shutdown,
    /// dropping retries that are still pending.
    pub async fn run_retries(&self) {
        let Some(requests) = self.retry_rx.lock().take() else {
            return;
        };

        let mut due = pin!(scheduler(requests).take_until(self.closed.notified()));
        while let Some(key) = due.next().await {
            self.add(key);
        }
    }

    /// Wait for the next key. Returns `None` once the queue is shut down.
    pub async fn get(&self) -> Option<K> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    let more = !state.queue.is_empty();
                    drop(state);
                    if more {
                        self.notify.notify_one();
                    }
                    return Some(key);
                }
            }
            notified.await;
        }
    }

    /// Release a key obtained from [`WorkQueue::get`]
    pub fn done(&self, key: &K) {
        {
            let mut state = self.state.lock();
            state.processing.remove(key);
            if !state.dirty.contains(key) || state.shutting_down {
                return;
            }
            state.queue.push_back(key.clone());
        }
        self.notify.notify_one();
    }

    pub fn shutdown(&self) {
        self.state.lock().shutting_down = true;
        self.notify.notify_waiters();
        self.closed.notify_one();
        self.retry_tx.close_channel();
    }

    /// Number of keys waiting to be picked up
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
