use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

use super::{Clipboard, HistorySearch, HostError, HostEvent, TabDirectory, WindowDirectory};
use crate::model::tab::{ChangeInfo, HistoryItem, HistoryQuery, Tab, TabId, TabUpdate, WindowId};

/// URL given to tabs created without one
pub const NEW_TAB_URL: &str = "chrome://newtab/";

/// A window and its tabs, kept in strip order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub id: WindowId,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

/// Serializable state of a simulated browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSnapshot {
    /// Next id handed out to a tab or window
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub focused_window: Option<WindowId>,
    #[serde(default)]
    pub windows: Vec<WindowState>,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    /// Last text written to the clipboard
    #[serde(default)]
    pub clipboard: Option<String>,
}

impl Default for BrowserSnapshot {
    fn default() -> Self {
        BrowserSnapshot {
            next_id: first_id(),
            focused_window: None,
            windows: Vec::new(),
            history: Vec::new(),
            clipboard: None,
        }
    }
}

fn first_id() -> u64 {
    1
}

/// Capability calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Query,
    Create,
    Update,
    Remove,
    Move,
    CurrentWindow,
    FocusWindow,
    CreateWindow,
    History,
}

/// In-process browser platform.
///
/// Keeps indices dense per window, at most one active tab per window, and
/// closes windows that lose their last tab. Every change is reported on the
/// channel returned by `subscribe`, including changes made through the
/// `external_*` helpers that stand in for other agents.
#[derive(Debug)]
pub struct MemoryBrowser {
    state: BrowserSnapshot,
    events: Option<Sender<HostEvent>>,
    failing: HashSet<Op>,
    /// When false, the primary clipboard path reports unavailable
    pub clipboard_available: bool,
    pub fallback_clipboard_available: bool,
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBrowser {
    pub fn new() -> Self {
        Self::from_snapshot(BrowserSnapshot::default())
    }

    pub fn from_snapshot(mut state: BrowserSnapshot) -> Self {
        for window in &mut state.windows {
            reindex(&mut window.tabs);
        }
        MemoryBrowser {
            state,
            events: None,
            failing: HashSet::new(),
            clipboard_available: true,
            fallback_clipboard_available: true,
        }
    }

    pub fn snapshot(&self) -> &BrowserSnapshot {
        &self.state
    }

    /// Start receiving change notifications. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> Receiver<HostEvent> {
        let (tx, rx) = mpsc::channel();
        self.events = Some(tx);
        rx
    }

    pub fn fail(&mut self, op: Op) {
        self.failing.insert(op);
    }

    pub fn heal(&mut self) {
        self.failing.clear();
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.state.clipboard.as_deref()
    }

    /// Tabs of a window in strip order
    pub fn tabs(&self, window: WindowId) -> Vec<Tab> {
        self.window(window).map(|w| w.tabs.clone()).unwrap_or_default()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.state
            .windows
            .iter()
            .flat_map(|w| w.tabs.iter())
            .find(|t| t.id == id)
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.state.windows.iter().map(|w| w.id).collect()
    }

    pub fn add_history(&mut self, item: HistoryItem) {
        self.state.history.push(item);
    }

    // -----------------------------------------------------------------------
    // Changes made by other agents
    // -----------------------------------------------------------------------

    /// Open an empty window and focus it
    pub fn external_open_window(&mut self) -> WindowId {
        let id = self.next_id();
        self.state.windows.push(WindowState {
            id,
            tabs: Vec::new(),
        });
        self.state.focused_window = Some(id);
        self.emit(HostEvent::WindowFocusChanged { window: Some(id) });
        id
    }

    /// Append a tab with a title, as if the user opened it directly
    pub fn external_open_tab(&mut self, window: WindowId, url: &str, title: &str) -> TabId {
        let id = self.next_id();
        let Some(w) = self.window_mut(window) else {
            return id;
        };
        let active = w.tabs.is_empty();
        w.tabs.push(Tab {
            id,
            window_id: window,
            index: w.tabs.len(),
            url: url.to_string(),
            title: title.to_string(),
            favicon_url: None,
            pinned: false,
            active,
        });
        self.emit(HostEvent::TabCreated { tab: id });
        id
    }

    pub fn external_set_title(&mut self, tab: TabId, title: &str) {
        if let Some(t) = self.tab_mut(tab) {
            t.title = title.to_string();
            self.emit(HostEvent::TabUpdated {
                tab,
                change: ChangeInfo {
                    title: Some(title.to_string()),
                    ..Default::default()
                },
            });
        }
    }

    pub fn external_close_tab(&mut self, tab: TabId) {
        self.remove_one(tab);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check(&self, op: Op) -> Result<(), HostError> {
        if self.failing.contains(&op) {
            Err(HostError::Unavailable(format!("{:?}", op)))
        } else {
            Ok(())
        }
    }

    fn emit(&self, event: HostEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.state.next_id;
        self.state.next_id += 1;
        id
    }

    fn window(&self, id: WindowId) -> Option<&WindowState> {
        self.state.windows.iter().find(|w| w.id == id)
    }

    fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowState> {
        self.state.windows.iter_mut().find(|w| w.id == id)
    }

    fn locate(&self, tab: TabId) -> Option<(usize, usize)> {
        self.state.windows.iter().enumerate().find_map(|(wi, w)| {
            w.tabs.iter().position(|t| t.id == tab).map(|ti| (wi, ti))
        })
    }

    fn tab_mut(&mut self, tab: TabId) -> Option<&mut Tab> {
        let (wi, ti) = self.locate(tab)?;
        Some(&mut self.state.windows[wi].tabs[ti])
    }

    /// Make `tab` the only active tab of its window
    fn activate(&mut self, wi: usize, tab: TabId) {
        for t in &mut self.state.windows[wi].tabs {
            t.active = t.id == tab;
        }
        self.emit(HostEvent::TabActivated { tab });
    }

    /// Take a tab out of its window, closing the window if it empties.
    fn detach(&mut self, wi: usize, ti: usize) -> Tab {
        let window = &mut self.state.windows[wi];
        let tab = window.tabs.remove(ti);
        reindex(&mut window.tabs);

        if window.tabs.is_empty() {
            let id = window.id;
            self.state.windows.remove(wi);
            if self.state.focused_window == Some(id) {
                self.state.focused_window = self.state.windows.first().map(|w| w.id);
                self.emit(HostEvent::WindowFocusChanged {
                    window: self.state.focused_window,
                });
            }
        } else if tab.active {
            let next = ti.min(window.tabs.len() - 1);
            let next_id = window.tabs[next].id;
            self.activate(wi, next_id);
        }
        tab
    }

    fn remove_one(&mut self, tab: TabId) -> bool {
        match self.locate(tab) {
            Some((wi, ti)) => {
                self.detach(wi, ti);
                self.emit(HostEvent::TabRemoved { tab });
                true
            }
            None => false,
        }
    }
}

fn reindex(tabs: &mut [Tab]) {
    for (i, t) in tabs.iter_mut().enumerate() {
        t.index = i;
    }
}

impl TabDirectory for MemoryBrowser {
    fn query(&mut self, window: WindowId) -> Result<Vec<Tab>, HostError> {
        self.check(Op::Query)?;
        self.window(window)
            .map(|w| w.tabs.clone())
            .ok_or(HostError::WindowNotFound(window))
    }

    fn create(
        &mut self,
        window: WindowId,
        url: Option<&str>,
        active: bool,
    ) -> Result<Tab, HostError> {
        self.check(Op::Create)?;
        let wi = self
            .state
            .windows
            .iter()
            .position(|w| w.id == window)
            .ok_or(HostError::WindowNotFound(window))?;
        let id = self.next_id();
        let tabs = &mut self.state.windows[wi].tabs;
        tabs.push(Tab {
            id,
            window_id: window,
            index: tabs.len(),
            url: url.unwrap_or(NEW_TAB_URL).to_string(),
            title: String::new(),
            favicon_url: None,
            pinned: false,
            active: false,
        });
        self.emit(HostEvent::TabCreated { tab: id });
        if active || self.state.windows[wi].tabs.len() == 1 {
            self.activate(wi, id);
        }
        let (wi, ti) = self.locate(id).ok_or(HostError::TabNotFound(id))?;
        Ok(self.state.windows[wi].tabs[ti].clone())
    }

    fn update(&mut self, tab: TabId, update: &TabUpdate) -> Result<Tab, HostError> {
        self.check(Op::Update)?;
        let (wi, ti) = self.locate(tab).ok_or(HostError::TabNotFound(tab))?;

        let mut change = ChangeInfo::default();
        {
            let t = &mut self.state.windows[wi].tabs[ti];
            if let Some(pinned) = update.pinned
                && pinned != t.pinned
            {
                t.pinned = pinned;
                change.pinned = Some(pinned);
            }
            if let Some(url) = &update.url {
                t.url = url.clone();
                change.url = Some(url.clone());
                change.status = Some("loading".to_string());
            }
        }
        if change != ChangeInfo::default() {
            self.emit(HostEvent::TabUpdated { tab, change });
        }
        if update.active == Some(true) {
            self.activate(wi, tab);
        }
        Ok(self.state.windows[wi].tabs[ti].clone())
    }

    fn remove(&mut self, tabs: &[TabId]) -> Result<(), HostError> {
        self.check(Op::Remove)?;
        let mut missing = None;
        for &tab in tabs {
            if !self.remove_one(tab) && missing.is_none() {
                missing = Some(tab);
            }
        }
        match missing {
            Some(tab) => Err(HostError::TabNotFound(tab)),
            None => Ok(()),
        }
    }

    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError> {
        self.check(Op::Move)?;
        let (wi, ti) = self.locate(tab).ok_or(HostError::TabNotFound(tab))?;
        let tabs = &mut self.state.windows[wi].tabs;
        let moved = tabs.remove(ti);
        let index = index.min(tabs.len());
        tabs.insert(index, moved);
        reindex(tabs);
        self.emit(HostEvent::TabMoved { tab });
        Ok(())
    }
}

impl WindowDirectory for MemoryBrowser {
    fn current(&mut self) -> Result<WindowId, HostError> {
        self.check(Op::CurrentWindow)?;
        self.state
            .focused_window
            .filter(|id| self.window(*id).is_some())
            .or_else(|| self.state.windows.first().map(|w| w.id))
            .ok_or_else(|| HostError::Unavailable("current window".to_string()))
    }

    fn focus(&mut self, window: WindowId) -> Result<(), HostError> {
        self.check(Op::FocusWindow)?;
        if self.window(window).is_none() {
            return Err(HostError::WindowNotFound(window));
        }
        if self.state.focused_window != Some(window) {
            self.state.focused_window = Some(window);
            self.emit(HostEvent::WindowFocusChanged {
                window: Some(window),
            });
        }
        Ok(())
    }

    fn create_with_tab(&mut self, tab: TabId, focused: bool) -> Result<WindowId, HostError> {
        self.check(Op::CreateWindow)?;
        let (wi, ti) = self.locate(tab).ok_or(HostError::TabNotFound(tab))?;
        let mut moved = self.detach(wi, ti);
        self.emit(HostEvent::TabDetached { tab });

        let id = self.next_id();
        moved.window_id = id;
        moved.index = 0;
        moved.active = true;
        self.state.windows.push(WindowState {
            id,
            tabs: vec![moved],
        });
        self.emit(HostEvent::TabAttached { tab });
        if focused {
            self.focus(id)?;
        }
        Ok(id)
    }
}

impl HistorySearch for MemoryBrowser {
    fn search(&mut self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, HostError> {
        self.check(Op::History)?;
        let needle = query.text.to_lowercase();
        let mut hits: Vec<HistoryItem> = self
            .state
            .history
            .iter()
            .filter(|h| h.last_visit_time >= query.start_time)
            .filter(|h| {
                h.url.to_lowercase().contains(&needle) || h.title.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.last_visit_time.total_cmp(&a.last_visit_time));
        hits.truncate(query.max_results);
        Ok(hits)
    }
}

impl Clipboard for MemoryBrowser {
    fn write_text(&mut self, text: &str) -> Result<(), HostError> {
        if !self.clipboard_available {
            return Err(HostError::Unavailable("clipboard".to_string()));
        }
        self.state.clipboard = Some(text.to_string());
        Ok(())
    }

    fn write_text_fallback(&mut self, text: &str) -> Result<(), HostError> {
        if !self.fallback_clipboard_available {
            return Err(HostError::Unavailable("fallback clipboard".to_string()));
        }
        self.state.clipboard = Some(text.to_string());
        Ok(())
    }
}
