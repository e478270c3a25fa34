//! Maintenance overlay view model

use serde::Serialize;

use crate::maintenance::MaintenanceState;
use crate::session::{clear_session, SessionStore};

/// Out-of-band way to reach support while the system is down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactAction {
    pub label: String,
    pub href: String,
}

/// Blocking overlay shown while maintenance mode is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceOverlay {
    pub message: String,
    pub login_route: String,
    pub contact: Option<ContactAction>,
}

/// Renders [`MaintenanceState`] and carries out the overlay's actions
#[derive(Debug, Clone)]
pub struct MaintenancePresenter {
    login_route: String,
    contact_email: Option<String>,
}

impl MaintenancePresenter {
    pub fn new(login_route: impl Into<String>, contact_email: Option<String>) -> Self {
        Self {
            login_route: login_route.into(),
            contact_email,
        }
    }

    /// Nothing while inactive; the overlay while active
    pub fn render(&self, state: &MaintenanceState) -> Option<MaintenanceOverlay> {
        let message = state.message()?;
        Some(MaintenanceOverlay {
            message: message.to_string(),
            login_route: self.login_route.clone(),
            contact: self.contact_email.as_ref().map(|email| ContactAction {
                label: "Contact support".to_string(),
                href: format!("mailto:{}", email),
            }),
        })
    }

    /// Clear the session markers and return the route to navigate to
    pub fn return_to_login(&self, session: &dyn SessionStore) -> crate::Result<&str> {
        clear_session(session)?;
        tracing::info!("Session cleared from maintenance overlay, returning to login");
        Ok(&self.login_route)
    }
}

impl MaintenanceOverlay {
    /// HTML fragment for server-rendered pages
    pub fn to_html(&self) -> String {
        let contact = self
            .contact
            .as_ref()
            .map(|c| {
                format!(
                    r#"<a href="{}" style="margin-left: 1rem;">{}</a>"#,
                    escape_html(&c.href),
                    escape_html(&c.label)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<div id="maintenance-overlay" role="alertdialog" style="position: fixed; inset: 0; background: rgba(0,0,0,0.6); display: flex; align-items: center; justify-content: center;">
    <div style="background: #fff; padding: 2rem; border-radius: 0.5rem; max-width: 32rem;">
        <h2>System maintenance</h2>
        <p id="maintenance-message">{}</p>
        <form method="post" action="/maintenance/return-to-login" style="display: inline;">
            <button type="submit">Return to login</button>
        </form>
        {}
    </div>
</div>"#,
            escape_html(&self.message),
            contact
        )
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
