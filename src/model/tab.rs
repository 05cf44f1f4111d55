use serde::{Deserialize, Serialize};

/// Platform-assigned tab identity, stable for the tab's lifetime.
pub type TabId = u64;

/// Platform-assigned window identity.
pub type WindowId = u64;

/// A tab as reported by the platform.
///
/// The engine only reads these; every change goes through a capability call.
/// `index` is dense within the window and reassigned by the platform on every
/// move or removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    pub index: usize,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
}

impl Tab {
    /// Title shown to the user, with a placeholder for blank titles.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

/// Fields a tab update may change. `None` leaves the attribute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabUpdate {
    pub active: Option<bool>,
    pub pinned: Option<bool>,
    pub url: Option<String>,
}

impl TabUpdate {
    pub fn activate() -> Self {
        TabUpdate {
            active: Some(true),
            ..Default::default()
        }
    }

    pub fn pin(pinned: bool) -> Self {
        TabUpdate {
            pinned: Some(pinned),
            ..Default::default()
        }
    }

    /// Navigate to `url` and bring the tab to the front.
    pub fn navigate(url: impl Into<String>) -> Self {
        TabUpdate {
            active: Some(true),
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Which attributes of a tab changed in an `updated` notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInfo {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ChangeInfo {
    /// Only status, title, favicon, and pinned changes affect the view.
    pub fn affects_view(&self) -> bool {
        self.status.is_some()
            || self.title.is_some()
            || self.favicon_url.is_some()
            || self.pinned.is_some()
    }
}

/// A history entry returned by the platform's history search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_visit_time: f64,
}

/// Parameters for a history search.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub text: String,
    pub max_results: usize,
    /// Milliseconds since the Unix epoch; entries visited earlier are skipped.
    pub start_time: f64,
}
