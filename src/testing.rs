//! Scripted in-memory remote for store tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use linkwatch_client::{FetchError, RemoteClient};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

/// One scripted answer to one request.
#[derive(Debug)]
pub enum Reply {
    Json(Value),
    Fail(FetchError),
    /// Held until the test sends the outcome.
    Gated(oneshot::Receiver<Result<Value, FetchError>>),
}

/// A `RemoteClient` that answers from per-path queues and records every
/// request it sees. A path with no queued reply answers 404.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<String>>,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply for `path`.
    pub fn json(&self, path: &str, body: Value) -> &Self {
        self.push(path, Reply::Json(body))
    }

    /// Queue a failure for `path`.
    pub fn fail(&self, path: &str, err: FetchError) -> &Self {
        self.push(path, Reply::Fail(err))
    }

    /// Queue a reply the test releases later through the returned sender.
    pub fn gated(&self, path: &str) -> oneshot::Sender<Result<Value, FetchError>> {
        let (tx, rx) = oneshot::channel();
        self.push(path, Reply::Gated(rx));
        tx
    }

    pub fn push(&self, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Every path requested so far, in issue order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Highest number of requests that were outstanding at once.
    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` requests have been issued.
    pub async fn wait_for_requests(&self, n: usize) {
        while self.requests.lock().len() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

struct Outstanding<'a>(&'a AtomicUsize);

impl Drop for Outstanding<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        self.requests.lock().push(path.to_string());
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);
        let _outstanding = Outstanding(&self.outstanding);

        let reply = self
            .routes
            .lock()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());

        match reply {
            Some(Reply::Json(body)) => {
                // Give other requests a chance to start
                tokio::task::yield_now().await;
                Ok(body)
            }
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Gated(rx)) => rx.await.unwrap_or(Err(FetchError::Cancelled)),
            None => Err(FetchError::Status {
                url: path.to_string(),
                status: 404,
            }),
        }
    }

    fn description(&self) -> &str {
        "scripted"
    }
}
