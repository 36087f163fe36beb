//! State store access for agent loops

use async_trait::async_trait;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use warden_api::{ClientName, TimerStatus, UnlockStatus};

/// Errors from a single state store fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("State store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the state store, as the agent sees it.
///
/// One call is one attempt: retry budgets live in the loops, not here.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether the store currently allows this client's session to stay unlocked
    async fn unlock_allowed(&self) -> Result<bool, FetchError>;

    /// Seconds until the next domain-block pass, if the store has a value
    async fn timer_seconds(&self) -> Result<Option<i64>, FetchError>;
}

/// HTTP client for the warden-server state store
pub struct HttpStateStore {
    client: Client,
    unlock_url: String,
    timer_url: String,
}

impl HttpStateStore {
    /// Timeout applied to every state store call
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base_url: &str, client_name: &ClientName) -> Self {
        let base = base_url.trim_end_matches('/');
        let client = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .connect_timeout(Self::REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            unlock_url: format!("{}/client/{}/unlock-status", base, client_name),
            timer_url: format!("{}/client/{}/youtube-timer", base, client_name),
        }
    }

    pub fn unlock_url(&self) -> &str {
        &self.unlock_url
    }

    pub fn timer_url(&self) -> &str {
        &self.timer_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl StateStore for HttpStateStore {
    async fn unlock_allowed(&self) -> Result<bool, FetchError> {
        let status: UnlockStatus = self.get_json(&self.unlock_url).await?;
        debug!(unlock = status.unlock, "Fetched unlock status");
        Ok(status.unlock)
    }

    async fn timer_seconds(&self) -> Result<Option<i64>, FetchError> {
        let status: TimerStatus = self.get_json(&self.timer_url).await?;
        debug!(timer_seconds = ?status.timer_seconds, "Fetched timer value");
        Ok(status.timer_seconds)
    }
}

/// Scripted state store for unit/integration testing.
///
/// Queued responses are consumed first; once the queue is empty the standing
/// behavior configured via the setters answers every call.
pub struct MockStateStore {
    unlock_queue: Mutex<VecDeque<Result<bool, ()>>>,
    timer_queue: Mutex<VecDeque<Result<Option<i64>, ()>>>,
    unlock_standing: Mutex<Result<bool, ()>>,
    timer_standing: Mutex<Result<Option<i64>, ()>>,
    unlock_fetches: AtomicU32,
    timer_fetches: AtomicU32,
}

impl MockStateStore {
    /// Store that answers locked-by-default with the standard timer
    pub fn new() -> Self {
        Self {
            unlock_queue: Mutex::new(VecDeque::new()),
            timer_queue: Mutex::new(VecDeque::new()),
            unlock_standing: Mutex::new(Ok(false)),
            timer_standing: Mutex::new(Ok(Some(warden_api::DEFAULT_TIMER_SECONDS))),
            unlock_fetches: AtomicU32::new(0),
            timer_fetches: AtomicU32::new(0),
        }
    }

    /// Standing unlock answer
    pub fn set_unlock(&self, value: bool) {
        *self.unlock_standing.lock().unwrap() = Ok(value);
    }

    /// Standing timer answer
    pub fn set_timer(&self, value: Option<i64>) {
        *self.timer_standing.lock().unwrap() = Ok(value);
    }

    /// Make every unqueued unlock fetch fail
    pub fn fail_unlock(&self) {
        *self.unlock_standing.lock().unwrap() = Err(());
    }

    /// Make every unqueued timer fetch fail
    pub fn fail_timer(&self) {
        *self.timer_standing.lock().unwrap() = Err(());
    }

    /// Queue one unlock answer ahead of the standing behavior
    pub fn queue_unlock(&self, value: bool) {
        self.unlock_queue.lock().unwrap().push_back(Ok(value));
    }

    /// Queue one failing unlock fetch
    pub fn queue_unlock_failure(&self) {
        self.unlock_queue.lock().unwrap().push_back(Err(()));
    }

    /// Queue one timer answer ahead of the standing behavior
    pub fn queue_timer(&self, value: Option<i64>) {
        self.timer_queue.lock().unwrap().push_back(Ok(value));
    }

    pub fn unlock_fetches(&self) -> u32 {
        self.unlock_fetches.load(Ordering::SeqCst)
    }

    pub fn timer_fetches(&self) -> u32 {
        self.timer_fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MockStateStore {
    async fn unlock_allowed(&self) -> Result<bool, FetchError> {
        self.unlock_fetches.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .unlock_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.unlock_standing.lock().unwrap());
        answer.map_err(|_| FetchError::Unavailable("scripted unlock failure".into()))
    }

    async fn timer_seconds(&self) -> Result<Option<i64>, FetchError> {
        self.timer_fetches.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .timer_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.timer_standing.lock().unwrap());
        answer.map_err(|_| FetchError::Unavailable("scripted timer failure".into()))
    }
}
