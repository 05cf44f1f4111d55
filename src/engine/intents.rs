//! User-triggered operations.
//!
//! Each intent asks the platform for a change and then refreshes. None of
//! them report errors to the caller: failures are logged and the intent
//! degrades to a no-op. Interaction state (edit, menu, nav box) is cleared
//! optimistically before the platform call.

use tracing::{info, warn};

use crate::host::{Host, HostError};
use crate::io::kv_store::KeyValueStore;
use crate::model::session::SessionId;
use crate::model::tab::{HistoryQuery, TabId, TabUpdate};
use crate::ops::search::{rank_history, web_search_url};
use crate::ops::url_edit::resolve_edit_url;

use super::Engine;

/// What happened to an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Nothing to do (missing tab, invalid input, no-op move)
    Ignored,
    /// The platform refused or failed; state left as it was
    Failed(HostError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

fn failed(action: &str, e: HostError) -> Outcome {
    warn!(action, error = %e, "platform call failed");
    Outcome::Failed(e)
}

impl<H: Host, S: KeyValueStore> Engine<H, S> {
    // -----------------------------------------------------------------------
    // Tab intents
    // -----------------------------------------------------------------------

    /// Make a tab active and focus its window.
    pub fn activate_tab(&mut self, id: TabId) -> Outcome {
        let outcome = match self.host.update(id, &TabUpdate::activate()) {
            Ok(tab) => match self.host.focus(tab.window_id) {
                Ok(()) => Outcome::Applied,
                Err(e) => failed("focus window", e),
            },
            Err(e) => failed("activate tab", e),
        };
        self.refresh();
        outcome
    }

    /// Invert a tab's pinned flag.
    pub fn toggle_pin(&mut self, id: TabId) -> Outcome {
        let outcome = match self.find_tab(id) {
            Ok(Some(tab)) => match self.host.update(id, &TabUpdate::pin(!tab.pinned)) {
                Ok(_) => Outcome::Applied,
                Err(e) => failed("toggle pin", e),
            },
            Ok(None) => Outcome::Ignored,
            Err(e) => failed("look up tab", e),
        };
        self.refresh();
        outcome
    }

    /// Close a tab. A tab that is already gone counts as closed.
    pub fn close_tab(&mut self, id: TabId) -> Outcome {
        self.ui.close_menu();
        let outcome = match self.host.remove(&[id]) {
            Ok(()) | Err(HostError::TabNotFound(_)) => Outcome::Applied,
            Err(e) => failed("close tab", e),
        };
        self.refresh();
        outcome
    }

    /// Drop `dragged` onto `target`: move it to the target's current index.
    /// Either tab missing from the window makes this a no-op.
    pub fn reorder(&mut self, dragged: Option<TabId>, target: TabId) -> Outcome {
        let Some(dragged) = dragged.filter(|d| *d != target) else {
            return Outcome::Ignored;
        };
        let tabs = match self.resolve_window().and_then(|w| self.host.query(w)) {
            Ok(tabs) => tabs,
            Err(e) => return failed("look up tabs", e),
        };
        let target_index = tabs.iter().find(|t| t.id == target).map(|t| t.index);
        let outcome = match target_index {
            Some(index) if tabs.iter().any(|t| t.id == dragged) => {
                match self.host.move_to(dragged, index) {
                    Ok(()) => Outcome::Applied,
                    Err(e) => failed("move tab", e),
                }
            }
            _ => Outcome::Ignored,
        };
        self.refresh();
        outcome
    }

    /// Open a new active tab in the engine's window.
    pub fn new_tab(&mut self, url: Option<&str>) -> Outcome {
        let outcome = match self.resolve_window() {
            Ok(window) => match self.host.create(window, url, true) {
                Ok(_) => Outcome::Applied,
                Err(e) => failed("create tab", e),
            },
            Err(e) => failed("resolve window", e),
        };
        self.refresh();
        outcome
    }

    /// Move a tab out into a new focused window.
    pub fn move_to_new_window(&mut self, id: TabId) -> Outcome {
        self.ui.close_menu();
        let outcome = match self.host.create_with_tab(id, true) {
            Ok(window) => {
                info!(tab = id, window, "tab moved to new window");
                Outcome::Applied
            }
            Err(e) => failed("create window", e),
        };
        self.refresh();
        outcome
    }

    /// Copy a tab's URL, falling back to the legacy clipboard path.
    pub fn copy_url(&mut self, id: TabId) -> Outcome {
        self.ui.close_menu();
        let outcome = match self.find_tab(id) {
            Ok(Some(tab)) => match self.host.write_text(&tab.url) {
                Ok(()) => Outcome::Applied,
                Err(e) => {
                    warn!(error = %e, "clipboard unavailable, using fallback");
                    match self.host.write_text_fallback(&tab.url) {
                        Ok(()) => Outcome::Applied,
                        Err(e) => failed("copy url", e),
                    }
                }
            },
            Ok(None) => Outcome::Ignored,
            Err(e) => failed("look up tab", e),
        };
        self.redraw();
        outcome
    }

    // -----------------------------------------------------------------------
    // Inline URL editing and menus
    // -----------------------------------------------------------------------

    /// Open the URL editor on a tab, seeded with its current URL.
    pub fn begin_edit(&mut self, id: TabId) -> Outcome {
        match self.find_tab(id) {
            Ok(Some(tab)) => {
                self.ui.begin_edit(id, &tab.url);
                self.redraw();
                Outcome::Applied
            }
            Ok(None) => Outcome::Ignored,
            Err(e) => failed("look up tab", e),
        }
    }

    pub fn edit_text(&mut self, text: &str) -> Outcome {
        if self.ui.set_edit_text(text) {
            self.redraw();
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }

    /// Submit the URL editor.
    ///
    /// Edit state is cleared first. Text that does not resolve to a URL, even
    /// with an `http://` prefix, leaves the tab untouched.
    pub fn submit_edit(&mut self) -> Outcome {
        let Some(edit) = self.ui.take_edit() else {
            return Outcome::Ignored;
        };
        let Some(url) = resolve_edit_url(&edit.text) else {
            self.redraw();
            return Outcome::Ignored;
        };
        let outcome = match self.host.update(edit.tab, &TabUpdate::navigate(url)) {
            Ok(tab) => match self.host.focus(tab.window_id) {
                Ok(()) => Outcome::Applied,
                Err(e) => failed("focus window", e),
            },
            Err(e) => failed("navigate tab", e),
        };
        self.refresh();
        outcome
    }

    /// Escape in the editor
    pub fn cancel_edit(&mut self) {
        self.ui.cancel_edit();
        self.redraw();
    }

    pub fn toggle_menu(&mut self, id: TabId) -> bool {
        let open = self.ui.toggle_menu(id);
        self.redraw();
        open
    }

    /// Outside click or Escape: close menus and abandon edits
    pub fn dismiss(&mut self) {
        self.ui.dismiss();
        self.redraw();
    }

    /// Collapse or expand a group. Returns the new collapsed state.
    pub fn toggle_collapse(&mut self, group_key: &str) -> bool {
        let collapsed = match self.stores_and_kv() {
            Ok((stores, kv)) => {
                let collapsed = stores.collapse.toggle(group_key);
                stores.collapse.save(kv);
                collapsed
            }
            Err(e) => {
                warn!(error = %e, "no window to collapse groups in");
                false
            }
        };
        self.redraw();
        collapsed
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Create a session and make it active. Blank titles get a numbered name.
    pub fn create_session(&mut self, title: &str) -> Option<SessionId> {
        let id = match self.stores_and_kv() {
            Ok((stores, kv)) => {
                let title = match title.trim() {
                    "" => format!("session {}", stores.sessions.sessions().len() + 1),
                    t => t.to_string(),
                };
                Some(stores.sessions.create_session(&title, kv))
            }
            Err(e) => {
                warn!(error = %e, "no window to create a session in");
                None
            }
        };
        self.refresh();
        id
    }

    pub fn rename_session(&mut self, id: &str, title: &str) -> Outcome {
        let outcome = match self.stores_and_kv() {
            Ok((stores, kv)) => match stores.sessions.rename_session(id, title.trim(), kv) {
                Ok(()) => Outcome::Applied,
                Err(e) => {
                    warn!(error = %e, "rename ignored");
                    Outcome::Ignored
                }
            },
            Err(e) => failed("resolve window", e),
        };
        self.refresh();
        outcome
    }

    /// Make another session active. Tabs opened from now on join it.
    pub fn switch_session(&mut self, id: &str) -> Outcome {
        let outcome = match self.stores_and_kv() {
            Ok((stores, kv)) => match stores.sessions.set_active(id, kv) {
                Ok(()) => Outcome::Applied,
                Err(e) => {
                    warn!(error = %e, "switch ignored");
                    Outcome::Ignored
                }
            },
            Err(e) => failed("resolve window", e),
        };
        self.refresh();
        outcome
    }

    /// Close a session together with its tabs.
    ///
    /// Member tabs are asked to close first; the session is removed even if
    /// some of them are already gone.
    pub fn close_session(&mut self, id: &str) -> Outcome {
        let members = match self.stores_and_kv() {
            Ok((stores, _)) if stores.sessions.record().contains(id) => {
                stores.sessions.record().tabs_in(id)
            }
            Ok(_) => return Outcome::Ignored,
            Err(e) => return failed("resolve window", e),
        };

        let mut outcome = Outcome::Applied;
        if !members.is_empty() {
            match self.host.remove(&members) {
                Ok(()) | Err(HostError::TabNotFound(_)) => {}
                Err(e) => outcome = failed("close session tabs", e),
            }
        }

        if let Ok((stores, kv)) = self.stores_and_kv()
            && let Err(e) = stores.sessions.close_session(id, kv)
        {
            warn!(error = %e, "session vanished while closing");
        }
        self.refresh();
        outcome
    }

    // -----------------------------------------------------------------------
    // Navigation box
    // -----------------------------------------------------------------------

    /// Update the navigation box text and its history suggestions.
    pub fn set_query(&mut self, text: &str) -> usize {
        let results = if text.trim().is_empty() {
            Vec::new()
        } else {
            // The platform also matches titles, so fetch a wider window than
            // the cap and let the URL filter run before truncating.
            let query = HistoryQuery {
                text: text.trim().to_string(),
                max_results: self
                    .config
                    .history_fetch_limit
                    .max(self.config.history_max_results),
                start_time: self.history_start_time(),
            };
            match self.host.search(&query) {
                Ok(items) => rank_history(items, &query.text, self.config.history_max_results),
                Err(e) => {
                    warn!(error = %e, "history search failed");
                    Vec::new()
                }
            }
        };
        let count = results.len();
        self.ui.set_nav(text, results);
        self.redraw();
        count
    }

    /// Submit the navigation box.
    ///
    /// With the modifier held, always runs a web search. Otherwise opens the
    /// top history suggestion, or searches when there is none.
    pub fn submit_query(&mut self, modifier: bool) -> Outcome {
        let nav = self.ui.nav().clone();
        let query = nav.query.trim();
        if query.is_empty() {
            return Outcome::Ignored;
        }
        let url = match nav.results.first() {
            Some(top) if !modifier => top.url.clone(),
            _ => web_search_url(&self.config.search_url, query),
        };
        self.ui.clear_nav();
        self.new_tab(Some(&url))
    }

    fn history_start_time(&self) -> f64 {
        match self.config.history_lookback_days {
            Some(days) => {
                let since = chrono::Utc::now() - chrono::Duration::days(i64::from(days));
                since.timestamp_millis() as f64
            }
            None => 0.0,
        }
    }
}
