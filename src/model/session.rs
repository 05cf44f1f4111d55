use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::tab::TabId;

/// Opaque session identity, unique within one window's session set.
pub type SessionId = String;

/// A named partition of a window's tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(default)]
    pub title: String,
}

/// Persisted session state for one window.
///
/// Every field is defaulted so partial records from older writes still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// Empty string means unset
    #[serde(default)]
    pub active_session_id: SessionId,
    /// Tab membership keyed by the decimal tab id
    #[serde(default)]
    pub tab_session: BTreeMap<String, SessionId>,
}

impl SessionRecord {
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn session_of(&self, tab: TabId) -> Option<&SessionId> {
        self.tab_session.get(&tab.to_string())
    }

    /// Tabs mapped to `id`, in id order. Unparsable keys are skipped.
    pub fn tabs_in(&self, id: &str) -> Vec<TabId> {
        let mut tabs: Vec<TabId> = self
            .tab_session
            .iter()
            .filter(|(_, sid)| sid.as_str() == id)
            .filter_map(|(key, _)| key.parse().ok())
            .collect();
        tabs.sort_unstable();
        tabs
    }

    /// Number of tabs mapped to `id`
    pub fn member_count(&self, id: &str) -> usize {
        self.tab_session.values().filter(|s| s.as_str() == id).count()
    }
}

/// Persisted collapse flags for one window, keyed by group key.
/// An absent key means expanded.
pub type CollapseRecord = BTreeMap<String, bool>;
