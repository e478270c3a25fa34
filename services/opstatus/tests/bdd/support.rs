//! Scripted backend used as the transport under the request pipeline

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use opstatus::io::{HttpClient, HttpResponse};
use opstatus::notifications::{Notification, NotificationId};
use opstatus::OpStatusError;

pub const BASE_URL: &str = "http://books.test";

pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

/// Fake backend: fixed replies per URL, plus a notifications collection that
/// honors mark-read calls
#[derive(Debug, Default)]
pub struct ScriptedApi {
    routes: Mutex<HashMap<String, Reply>>,
    notifications: Mutex<Vec<Notification>>,
    calls: AtomicUsize,
    mark_read_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path), Reply::Respond(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, path: &str, reason: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path), Reply::Fail(reason.to_string()));
    }

    pub fn set_notifications(&self, items: Vec<Notification>) {
        *self.notifications.lock().unwrap() = items;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn mark_read_calls(&self) -> usize {
        self.mark_read_calls.load(Ordering::SeqCst)
    }

    fn scripted(&self, url: &str) -> Option<opstatus::Result<HttpResponse>> {
        self.routes.lock().unwrap().get(url).map(|reply| match reply {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Fail(reason) => Err(OpStatusError::Http(reason.clone())),
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedApi {
    async fn get(&self, url: &str) -> opstatus::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reply) = self.scripted(url) {
            return reply;
        }
        if url.ends_with("/api/notifications") {
            let items = self.notifications.lock().unwrap().clone();
            return Ok(HttpResponse::new(200, serde_json::to_string(&items)?));
        }
        Ok(HttpResponse::new(404, "not found"))
    }

    async fn post_json(
        &self,
        url: &str,
        _body: &serde_json::Value,
    ) -> opstatus::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reply) = self.scripted(url) {
            return reply;
        }
        if let Some(id) = url
            .strip_suffix("/read")
            .and_then(|rest| rest.rsplit('/').next())
        {
            self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
            let mut items = self.notifications.lock().unwrap();
            if let Some(n) = items.iter_mut().find(|n| n.id.as_str() == id) {
                n.is_read = true;
                return Ok(HttpResponse::new(200, r#"{"success":true}"#));
            }
        }
        Ok(HttpResponse::new(404, "not found"))
    }
}

/// `total` notifications, most recent first, the first `unread` of them unread
pub fn notifications(total: usize, unread: usize) -> Vec<Notification> {
    (0..total)
        .map(|i| Notification {
            id: NotificationId::new((total - i).to_string()),
            message: format!("Journal entry {} posted", total - i),
            is_read: i >= unread,
            link_url: Some(format!("/journal/{}", total - i)),
            created_at: format!("2024-03-{:02}T09:00:00Z", (total - i) % 28 + 1),
        })
        .collect()
}
