use std::collections::HashSet;

use crate::model::tab::{HistoryItem, TabId};
use crate::model::view::{NavView, TabMode};

/// An inline URL edit in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub tab: TabId,
    pub text: String,
}

/// Transient interaction state. Never persisted.
///
/// At most one tab is being edited and at most one menu is open; both are
/// single optional values rather than per-tab flags.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    editing: Option<EditState>,
    menu: Option<TabId>,
    nav: NavView,
}

impl UiState {
    /// Open the URL editor on `tab`, seeded with `text`. Closes any open menu
    /// and replaces an edit in progress on another tab.
    pub fn begin_edit(&mut self, tab: TabId, text: &str) {
        self.menu = None;
        self.editing = Some(EditState {
            tab,
            text: text.to_string(),
        });
    }

    /// Replace the in-progress text. Returns false when nothing is being edited.
    pub fn set_edit_text(&mut self, text: &str) -> bool {
        match &mut self.editing {
            Some(edit) => {
                edit.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove and return the current edit (submit path)
    pub fn take_edit(&mut self) -> Option<EditState> {
        self.editing.take()
    }

    pub fn editing(&self) -> Option<&EditState> {
        self.editing.as_ref()
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Open the menu for `tab`, or close it if it is already open there.
    /// Returns whether a menu is open afterwards.
    pub fn toggle_menu(&mut self, tab: TabId) -> bool {
        if self.menu == Some(tab) {
            self.menu = None;
        } else {
            self.menu = Some(tab);
        }
        self.menu.is_some()
    }

    pub fn close_menu(&mut self) {
        self.menu = None;
    }

    pub fn open_menu(&self) -> Option<TabId> {
        self.menu
    }

    /// Outside click or Escape: close the menu and drop any edit
    pub fn dismiss(&mut self) {
        self.menu = None;
        self.editing = None;
    }

    pub fn mode_for(&self, tab: TabId) -> TabMode {
        match &self.editing {
            Some(edit) if edit.tab == tab => TabMode::Editing(edit.text.clone()),
            _ => TabMode::Normal,
        }
    }

    pub fn menu_open(&self, tab: TabId) -> bool {
        self.menu == Some(tab)
    }

    /// Forget edit and menu state for tabs that are gone
    pub fn retain_tabs(&mut self, live: &HashSet<TabId>) {
        if self.editing.as_ref().is_some_and(|e| !live.contains(&e.tab)) {
            self.editing = None;
        }
        if self.menu.is_some_and(|m| !live.contains(&m)) {
            self.menu = None;
        }
    }

    pub fn nav(&self) -> &NavView {
        &self.nav
    }

    pub fn set_nav(&mut self, query: &str, results: Vec<HistoryItem>) {
        self.nav = NavView {
            query: query.to_string(),
            results,
        };
    }

    pub fn clear_nav(&mut self) {
        self.nav = NavView::default();
    }
}
