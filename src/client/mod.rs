//! Library client for the swipe feed.
//!
//! `FeedClient` drives the HTTP API the way the swipe screen does: it keeps a
//! local [`FeedState`] queue, removes cards optimistically, and maps the
//! server's benign error signals (duplicate, quota) to outcomes the caller
//! can route on. Anything unexpected rolls the state back by refetching the
//! authoritative feed and quota.

pub mod state;

pub use state::FeedState;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{ProjectStatus, SwipeDirection};
use crate::pagination::DEFAULT_LIMIT;

/// A feed entry as served by `GET /feed`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedCard {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub teaser: Option<String>,
    pub categories: Vec<String>,
    pub status: ProjectStatus,
    pub created_at: chrono::NaiveDateTime,
    pub owner_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeStats {
    pub today_swipes: i64,
    pub max_daily_swipes: i64,
    pub remaining_swipes: i64,
    pub limit_reached: bool,
}

#[derive(Debug, Deserialize)]
struct FeedPage {
    items: Vec<FeedCard>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
}

/// What happened to a swipe, from the caller's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// The server recorded the decision.
    Recorded,
    /// The server had already seen this decision; the optimistic removal was
    /// correct, nothing to do.
    AlreadySwiped,
    /// Daily quota exhausted; the caller should route to the upsell screen
    /// instead of retrying.
    LimitReached,
    /// Something else went wrong; the state was rebuilt from the server.
    RolledBack,
    /// The local queue was empty; no request was sent.
    FeedEmpty,
}

#[derive(Debug)]
pub enum ClientError {
    Http(reqwest::Error),
    Unauthenticated,
    UnexpectedStatus {
        status: u16,
        code: Option<String>,
    },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Unauthenticated => write!(f, "Not authenticated"),
            ClientError::UnexpectedStatus { status, code } => match code {
                Some(code) => write!(f, "Unexpected response {} ({})", status, code),
                None => write!(f, "Unexpected response {}", status),
            },
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    page_size: i64,
    state: FeedState,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
            page_size: DEFAULT_LIMIT,
            state: FeedState::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Rebuilds the queue and quota counters from the server.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let items = self.fetch_feed(0).await?;
        let stats = self.fetch_stats().await?;
        self.state.replace(items, &stats);
        Ok(())
    }

    /// Fetches the next feed page and appends it to the queue.
    pub async fn load_more(&mut self) -> Result<usize, ClientError> {
        let items = self.fetch_feed(self.state.len() as i64).await?;
        let loaded = items.len();
        self.state.extend(items);
        Ok(loaded)
    }

    /// Swipes the current card. The card leaves the local queue and the
    /// quota counter drops before the request is sent; see [`SwipeOutcome`]
    /// for how each server response is absorbed.
    pub async fn swipe_current(
        &mut self,
        direction: SwipeDirection,
    ) -> Result<SwipeOutcome, ClientError> {
        let Some(card) = self.state.optimistic_swipe() else {
            return Ok(SwipeOutcome::FeedEmpty);
        };

        let response = self
            .http
            .post(format!("{}/swipes", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "projectId": card.id,
                "direction": direction.as_str(),
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                // Counters drift if another session swiped meanwhile; take
                // the server's word after every success.
                if let Ok(stats) = self.fetch_stats().await {
                    self.state.apply_stats(&stats);
                }
                debug!(project_id = %card.id, direction = direction.as_str(), "Swipe recorded");
                Ok(SwipeOutcome::Recorded)
            }
            StatusCode::CONFLICT => {
                debug!(project_id = %card.id, "Already swiped; keeping optimistic removal");
                Ok(SwipeOutcome::AlreadySwiped)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.state.mark_limit_reached();
                Ok(SwipeOutcome::LimitReached)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthenticated),
            status => {
                warn!(status = %status, project_id = %card.id, "Swipe failed; refetching feed");
                self.refresh().await?;
                Ok(SwipeOutcome::RolledBack)
            }
        }
    }

    async fn fetch_feed(&self, offset: i64) -> Result<Vec<FeedCard>, ClientError> {
        let response = self
            .http
            .get(format!(
                "{}/feed?limit={}&offset={}",
                self.base_url, self.page_size, offset
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let page: FeedPage = Self::expect_ok(response).await?.json().await?;
        Ok(page.items)
    }

    async fn fetch_stats(&self) -> Result<SwipeStats, ClientError> {
        let response = self
            .http
            .get(format!("{}/swipes", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let stats: SwipeStats = Self::expect_ok(response).await?.json().await?;
        Ok(stats)
    }

    async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthenticated),
            status => {
                let code = response.json::<ErrorBody>().await.ok().and_then(|b| b.code);
                Err(ClientError::UnexpectedStatus {
                    status: status.as_u16(),
                    code,
                })
            }
        }
    }
}
