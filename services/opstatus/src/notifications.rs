//! User notification poller
//!
//! Fetches the notification list through the shared request pipeline, keeps
//! the latest list, and acknowledges entries. The remote collaborator is the
//! only source of truth for read-state: nothing is marked read locally, every
//! acknowledgment is followed by a re-fetch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::periodic::PeriodicTask;

/// Number of entries shown before the "N more" indicator
pub const DEFAULT_DISPLAY_LIMIT: usize = 15;

/// Notification identity. The API may send it as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => NotificationId(s),
            RawId::Number(n) => NotificationId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub is_read: bool,
    #[serde(default)]
    pub link_url: Option<String>,
    pub created_at: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload {
    Bare(Vec<Notification>),
    Envelope {
        #[serde(alias = "data")]
        notifications: Vec<Notification>,
    },
}

/// Parse a notifications payload: either a bare array or an object holding
/// the array under `notifications` (or `data`).
pub fn parse_list(body: &str) -> Option<Vec<Notification>> {
    match serde_json::from_str::<ListPayload>(body) {
        Ok(ListPayload::Bare(items)) | Ok(ListPayload::Envelope { notifications: items }) => {
            Some(items)
        }
        Err(_) => None,
    }
}

/// Latest fetched list, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationList {
    ticket: u64,
    items: Vec<Notification>,
}

impl NotificationList {
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Unread entries across the whole list, never just the displayed part
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn unread_ids(&self) -> Vec<NotificationId> {
        self.items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Display slice of at most `limit` entries
    pub fn view(&self, limit: usize) -> NotificationView {
        NotificationView {
            unread_count: self.unread_count(),
            hidden_count: self.items.len().saturating_sub(limit),
            items: self.items.iter().take(limit).cloned().collect(),
        }
    }
}

/// What the notification bell shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub items: Vec<Notification>,
    pub unread_count: usize,
    pub hidden_count: usize,
}

impl NotificationView {
    /// "N more" label when the list was truncated
    pub fn more_label(&self) -> Option<String> {
        (self.hidden_count > 0).then(|| format!("{} more", self.hidden_count))
    }
}

/// Polls and acknowledges notifications
pub struct NotificationPoller {
    list_url: String,
    http: Arc<dyn HttpClient>,
    display_limit: usize,
    next_ticket: AtomicU64,
    tx: watch::Sender<NotificationList>,
}

impl fmt::Debug for NotificationPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationPoller")
            .field("list_url", &self.list_url)
            .field("display_limit", &self.display_limit)
            .finish()
    }
}

impl NotificationPoller {
    pub fn new(list_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let (tx, _rx) = watch::channel(NotificationList::default());
        let list_url = list_url.into();
        tracing::debug!("Created NotificationPoller for {}", list_url);
        Self {
            list_url,
            http,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            next_ticket: AtomicU64::new(1),
            tx,
        }
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }

    /// Fetch the list. Never fails: any fetch or shape problem yields an
    /// empty list. The result is published unless a fetch that started
    /// later has already been published.
    pub async fn fetch_list(&self) -> Vec<Notification> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let items = self.load().await;

        let published = self.tx.send_if_modified(|list| {
            if ticket > list.ticket {
                *list = NotificationList {
                    ticket,
                    items: items.clone(),
                };
                true
            } else {
                false
            }
        });
        if !published {
            tracing::debug!("Discarding stale notification fetch #{}", ticket);
        }
        items
    }

    async fn load(&self) -> Vec<Notification> {
        let response = match self.http.get(&self.list_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Failed to fetch notifications: {}", e);
                return Vec::new();
            }
        };

        if !response.is_success() {
            tracing::debug!("Non-success notifications response: status={}", response.status);
            return Vec::new();
        }

        parse_list(&response.body).unwrap_or_else(|| {
            tracing::warn!("Unexpected notifications payload, showing none");
            Vec::new()
        })
    }

    /// `{list_url}/{id}/read` with the id encoded as a single path segment
    fn read_url(&self, id: &NotificationId) -> Option<String> {
        let mut url = reqwest::Url::parse(&self.list_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(id.as_str())
            .push("read");
        Some(url.into())
    }

    async fn mark_read(&self, id: &NotificationId) -> bool {
        let Some(url) = self.read_url(id) else {
            tracing::warn!(
                "Cannot build mark-read URL from {} for notification {}",
                self.list_url,
                id
            );
            return false;
        };
        match self.http.post_json(&url, &serde_json::json!({})).await {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    "Marking notification {} read returned status {}",
                    id,
                    response.status
                );
                false
            }
            Err(e) => {
                tracing::warn!("Marking notification {} read failed: {}", id, e);
                false
            }
        }
    }

    /// Mark one notification read, then re-fetch. Returns whether the
    /// collaborator accepted the acknowledgment.
    pub async fn acknowledge(&self, id: &NotificationId) -> bool {
        let accepted = self.mark_read(id).await;
        self.fetch_list().await;
        accepted
    }

    /// Acknowledge every currently unread notification one at a time, then
    /// re-fetch once. Returns how many were accepted.
    pub async fn acknowledge_all(&self) -> usize {
        let unread = self.tx.borrow().unread_ids();
        let mut accepted = 0;
        for id in &unread {
            if self.mark_read(id).await {
                accepted += 1;
            }
        }
        tracing::debug!("Acknowledged {}/{} notifications", accepted, unread.len());
        self.fetch_list().await;
        accepted
    }

    pub fn current(&self) -> NotificationList {
        self.tx.borrow().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.tx.borrow().unread_count()
    }

    pub fn view(&self) -> NotificationView {
        self.tx.borrow().view(self.display_limit)
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationList> {
        self.tx.subscribe()
    }

    /// Fetch now and every `interval` until cancelled
    pub fn spawn(self: &Arc<Self>, interval: Duration, parent: &CancellationToken) -> PeriodicTask {
        let poller = Arc::clone(self);
        PeriodicTask::spawn("notification-poller", interval, parent, move || {
            let poller = Arc::clone(&poller);
            async move {
                poller.fetch_list().await;
            }
        })
    }
}
