use serde::Serialize;

use super::session::SessionId;
use super::tab::{Tab, WindowId};

/// How a tab row is displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "text", rename_all = "lowercase")]
pub enum TabMode {
    Normal,
    /// Inline URL editor open, holding the in-progress text
    Editing(String),
}

/// A tab row in the render model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    #[serde(flatten)]
    pub tab: Tab,
    /// Favicon to show (falls back to `<origin>/favicon.ico`)
    pub icon: String,
    pub mode: TabMode,
    pub menu_open: bool,
}

/// A derived origin group. Not persisted; rebuilt every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub key: String,
    pub title: String,
    /// Lowest tab index among the members
    pub first_index: usize,
    pub collapsed: bool,
    pub tabs: Vec<TabView>,
}

impl GroupView {
    pub fn count(&self) -> usize {
        self.tabs.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub active: bool,
    pub tab_count: usize,
}

/// Navigation box contents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavView {
    pub query: String,
    pub results: Vec<super::tab::HistoryItem>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderModel {
    pub window_id: Option<WindowId>,
    pub sessions: Vec<SessionSummary>,
    pub active_session: SessionId,
    pub filter: String,
    pub groups: Vec<GroupView>,
    pub nav: NavView,
}

impl RenderModel {
    /// Visible tab count across all groups
    pub fn tab_count(&self) -> usize {
        self.groups.iter().map(GroupView::count).sum()
    }

    pub fn group(&self, key: &str) -> Option<&GroupView> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Tabs in display order
    pub fn tabs(&self) -> impl Iterator<Item = &TabView> {
        self.groups.iter().flat_map(|g| g.tabs.iter())
    }
}
