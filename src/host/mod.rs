//! Capabilities the engine consumes from the browser platform.
//!
//! The engine never owns tabs or windows. It reads them through these traits
//! and asks for changes; the platform reports what actually happened through
//! its change feed (`HostEvent`).

pub mod memory;

pub use memory::{BrowserSnapshot, MemoryBrowser};

use serde::{Deserialize, Serialize};

use crate::model::tab::{ChangeInfo, HistoryItem, HistoryQuery, Tab, TabId, TabUpdate, WindowId};

/// Error type for platform capability calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("no tab with id {0}")]
    TabNotFound(TabId),
    #[error("no window with id {0}")]
    WindowNotFound(WindowId),
    #[error("{0} is unavailable")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

pub trait TabDirectory {
    /// Tabs of one window, in no particular order
    fn query(&mut self, window: WindowId) -> Result<Vec<Tab>, HostError>;
    fn create(&mut self, window: WindowId, url: Option<&str>, active: bool)
    -> Result<Tab, HostError>;
    fn update(&mut self, tab: TabId, update: &TabUpdate) -> Result<Tab, HostError>;
    fn remove(&mut self, tabs: &[TabId]) -> Result<(), HostError>;
    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError>;
}

pub trait WindowDirectory {
    fn current(&mut self) -> Result<WindowId, HostError>;
    fn focus(&mut self, window: WindowId) -> Result<(), HostError>;
    /// Open a new window seeded with an existing tab
    fn create_with_tab(&mut self, tab: TabId, focused: bool) -> Result<WindowId, HostError>;
}

pub trait HistorySearch {
    fn search(&mut self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, HostError>;
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), HostError>;
    /// Legacy synchronous path used when `write_text` is unavailable
    fn write_text_fallback(&mut self, text: &str) -> Result<(), HostError>;
}

/// Everything the engine needs from the platform
pub trait Host: TabDirectory + WindowDirectory + HistorySearch + Clipboard {}

impl<T: TabDirectory + WindowDirectory + HistorySearch + Clipboard> Host for T {}

/// Change notifications from the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    TabCreated { tab: TabId },
    TabRemoved { tab: TabId },
    TabUpdated { tab: TabId, change: ChangeInfo },
    TabMoved { tab: TabId },
    TabActivated { tab: TabId },
    TabDetached { tab: TabId },
    TabAttached { tab: TabId },
    WindowFocusChanged { window: Option<WindowId> },
}

impl HostEvent {
    /// Whether this notification can change the rendered view
    pub fn triggers_refresh(&self) -> bool {
        match self {
            HostEvent::TabUpdated { change, .. } => change.affects_view(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_only_update_does_not_refresh() {
        let event = HostEvent::TabUpdated {
            tab: 1,
            change: ChangeInfo {
                url: Some("https://example.com".into()),
                ..Default::default()
            },
        };
        assert!(!event.triggers_refresh());
        assert!(HostEvent::TabMoved { tab: 1 }.triggers_refresh());
        assert!(HostEvent::WindowFocusChanged { window: None }.triggers_refresh());
    }
}
