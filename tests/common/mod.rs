#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio::time::Instant;

use restock::error::{AppError, FetchError, NotifyError};
use restock::models::{FetchConfig, Product, StateMap};
use restock::pipeline::MonitorOptions;
use restock::services::{Fetcher, HttpSource, Notifier, RawResponse};
use restock::storage::StateStore;

type Reply = Result<RawResponse, FetchError>;

/// Per-URL queue of scripted attempt outcomes.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    attempts: Mutex<HashMap<String, usize>>,
    started: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, url: &str, status: u16, body: &str) {
        self.push(url, Ok(RawResponse::new(status, body)));
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.push(url, Err(FetchError::transport(url, message)));
    }

    fn push(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn attempts(&self, url: &str) -> usize {
        self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Clock readings at which each request to `url` was made.
    pub fn request_times(&self, url: &str) -> Vec<Instant> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl HttpSource for ScriptedSource {
    async fn get(&self, url: &str, _headers: HeaderMap, _timeout: Duration) -> Reply {
        self.started
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;
        self.replies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(FetchError::transport(url, "no scripted reply")))
    }
}

pub fn fetcher(source: &Arc<ScriptedSource>) -> Fetcher {
    Fetcher::new(source.clone(), &FetchConfig::default())
}

/// No pacing so tests run instantly.
pub fn options() -> MonitorOptions {
    MonitorOptions {
        max_concurrent: 4,
        request_delay: Duration::ZERO,
        jitter_ms: 0,
        fetch_timeout: Duration::from_secs(40),
        persist_state: true,
    }
}

pub fn product(name: &str, url: &str) -> Product {
    Product {
        name: name.to_string(),
        url: url.to_string(),
        available_keywords: vec!["comprar ahora".to_string()],
        soldout_keywords: vec!["agotado".to_string()],
        category_tag: None,
    }
}

pub const IN_STOCK: &str = "<html><button>Comprar Ahora</button></html>";
pub const SOLD_OUT: &str = "<html><span>Producto agotado</span></html>";

/// Records every message; can be told to report delivery failure.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries fail, but messages are still recorded.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("simulated delivery failure".into()));
        }
        Ok(())
    }
}

/// State kept in memory, with switchable write failures.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: Mutex<StateMap>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StateMap) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StateMap {
        self.state.lock().unwrap().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self) -> StateMap {
        self.snapshot()
    }

    async fn save(&self, state: &StateMap) -> restock::error::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::state_write(self.location(), "writes disabled"));
        }
        *self.state.lock().unwrap() = state.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
