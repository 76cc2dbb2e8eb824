//! Remote user source: record types, the HTTP fetcher and the background load task.
//!
//! The endpoint serves a static JSON document shaped like `{ "users": [...] }`.
//! There is no server-side paging; the whole list is read once and paged in memory.
//!
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Default location of the account users document.
pub const DEFAULT_USERS_URL: &str = "https://mbilals.github.io/klausTestData/db.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Permission level of an account user.
///
/// Role names the client does not know decode as [`Role::Unknown`], so one odd
/// record costs only its own chip colour.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Agent,
    AccountManager,
    ExternalReviewer,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Lowercase display label with the underscore turned into a space.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::AccountManager => "account manager",
            Role::ExternalReviewer => "external reviewer",
            Role::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub role: Role,
}

impl UserRecord {
    /// Up to two uppercase initials, used in place of the avatar image.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Deserialize)]
struct UsersPayload {
    users: Vec<UserRecord>,
}

/// Decode the `{ "users": [...] }` document.
pub fn parse_users(body: &[u8]) -> Result<Vec<UserRecord>, FetchError> {
    let payload: UsersPayload = serde_json::from_slice(body)?;
    Ok(payload.users)
}

/// Reads the user list from a fixed URL.
#[derive(Clone, Debug)]
pub struct UserFetcher {
    client: Client,
    url: String,
}

impl UserFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self::with_client(url, client))
    }

    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one unauthenticated GET and decode the payload.
    pub async fn fetch(&self) -> Result<Vec<UserRecord>, FetchError> {
        let transport = |source| FetchError::Transport {
            url: self.url.clone(),
            source,
        };
        let response = self.client.get(&self.url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }
        let body = response.bytes().await.map_err(transport)?;
        parse_users(&body)
    }

    /// Like [`fetch`](Self::fetch) but a failure is logged and yields an empty list.
    pub async fn fetch_or_empty(&self) -> Vec<UserRecord> {
        match self.fetch().await {
            Ok(users) => {
                tracing::info!(count = users.len(), url = %self.url, "loaded users");
                users
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load users");
                Vec::new()
            }
        }
    }
}

/// Outcome of polling a [`PendingLoad`].
#[derive(Debug, PartialEq, Eq)]
pub enum LoadPoll {
    Pending,
    Ready(Vec<UserRecord>),
    /// The task was cancelled or died before producing a result.
    Abandoned,
}

/// Handle to a user load running on the tokio runtime.
///
/// Dropping the handle cancels the task, so a torn down view never receives a
/// late result.
#[derive(Debug)]
pub struct PendingLoad {
    cancel: CancellationToken,
    rx: oneshot::Receiver<Vec<UserRecord>>,
}

impl PendingLoad {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Non-blocking check for the result; meant to be called from the UI tick.
    pub fn poll(&mut self) -> LoadPoll {
        if self.cancel.is_cancelled() {
            return LoadPoll::Abandoned;
        }
        match self.rx.try_recv() {
            Ok(users) => LoadPoll::Ready(users),
            Err(TryRecvError::Empty) => LoadPoll::Pending,
            Err(TryRecvError::Closed) => LoadPoll::Abandoned,
        }
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start fetching on `handle`; the result is picked up with [`PendingLoad::poll`].
pub fn spawn_load(handle: &Handle, fetcher: UserFetcher) -> PendingLoad {
    let cancel = CancellationToken::new();
    let (tx, rx) = oneshot::channel();
    let token = cancel.clone();
    tracing::info!(url = %fetcher.url(), "loading users");
    handle.spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("user load cancelled");
            }
            users = fetcher.fetch_or_empty() => {
                let _ = tx.send(users);
            }
        }
    });
    PendingLoad { cancel, rx }
}
