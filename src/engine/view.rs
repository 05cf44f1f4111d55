use crate::model::tab::{Tab, WindowId};
use crate::model::view::{GroupView, RenderModel, SessionSummary, TabView};
use crate::ops::grouping::{OriginGrouper, favicon_url, group_tabs};
use crate::ops::search::matches_filter;
use crate::store::{CollapseStore, SessionStore};

use super::ui_state::UiState;

/// Inputs for one render pass
pub struct ViewInputs<'a> {
    pub window_id: WindowId,
    pub tabs: &'a [Tab],
    pub sessions: &'a SessionStore,
    pub collapse: &'a CollapseStore,
    pub ui: &'a UiState,
    pub grouper: &'a OriginGrouper,
    pub filter: &'a str,
}

/// Derive the render model from a reconciled tab list.
///
/// Keeps tabs of the active session that pass the text filter, groups them
/// by origin, and decorates them with collapse and interaction state.
pub fn build_view(inputs: &ViewInputs<'_>) -> RenderModel {
    let active = inputs.sessions.active_id();
    let visible: Vec<&Tab> = inputs
        .tabs
        .iter()
        .filter(|t| inputs.sessions.session_of(t.id).map(String::as_str) == Some(active))
        .filter(|t| matches_filter(t, inputs.filter))
        .collect();

    let groups = group_tabs(inputs.grouper, &visible)
        .into_iter()
        .map(|group| GroupView {
            collapsed: inputs.collapse.is_collapsed(&group.key),
            tabs: group
                .tabs
                .iter()
                .map(|tab| TabView {
                    icon: favicon_url(tab),
                    mode: inputs.ui.mode_for(tab.id),
                    menu_open: inputs.ui.menu_open(tab.id),
                    tab: (*tab).clone(),
                })
                .collect(),
            key: group.key,
            title: group.title,
            first_index: group.first_index,
        })
        .collect();

    let record = inputs.sessions.record();
    let sessions = record
        .sessions
        .iter()
        .map(|s| SessionSummary {
            id: s.id.clone(),
            title: s.title.clone(),
            active: s.id == active,
            tab_count: record.member_count(&s.id),
        })
        .collect();

    RenderModel {
        window_id: Some(inputs.window_id),
        sessions,
        active_session: active.to_string(),
        filter: inputs.filter.to_string(),
        groups,
        nav: inputs.ui.nav().clone(),
    }
}

/// Re-apply collapse and interaction state to an existing model without
/// re-reading the tab list.
pub fn redecorate(model: &mut RenderModel, collapse: &CollapseStore, ui: &UiState) {
    for group in &mut model.groups {
        group.collapsed = collapse.is_collapsed(&group.key);
        for view in &mut group.tabs {
            view.mode = ui.mode_for(view.tab.id);
            view.menu_open = ui.menu_open(view.tab.id);
        }
    }
    model.nav = ui.nav().clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::kv_store::MemoryStore;
    use crate::model::view::TabMode;

    fn tab(id: u64, index: usize, title: &str, url: &str) -> Tab {
        Tab {
            id,
            window_id: 1,
            index,
            url: url.into(),
            title: title.into(),
            favicon_url: None,
            pinned: false,
            active: index == 0,
        }
    }

    struct Fixture {
        tabs: Vec<Tab>,
        sessions: SessionStore,
        collapse: CollapseStore,
        ui: UiState,
        grouper: OriginGrouper,
    }

    impl Fixture {
        fn new(tabs: Vec<Tab>) -> Self {
            let kv = MemoryStore::new();
            let mut sessions = SessionStore::load(1, &kv, "default");
            let live: Vec<u64> = tabs.iter().map(|t| t.id).collect();
            sessions.reconcile_membership(&live);
            Fixture {
                tabs,
                sessions,
                collapse: CollapseStore::load(1, &kv),
                ui: UiState::default(),
                grouper: OriginGrouper::default(),
            }
        }

        fn view(&self, filter: &str) -> RenderModel {
            build_view(&ViewInputs {
                window_id: 1,
                tabs: &self.tabs,
                sessions: &self.sessions,
                collapse: &self.collapse,
                ui: &self.ui,
                grouper: &self.grouper,
                filter,
            })
        }
    }

    #[test]
    fn filter_keeps_matching_tabs_only() {
        let fx = Fixture::new(vec![
            tab(1, 0, "GitHub", "https://github.com/x"),
            tab(2, 1, "Other", "https://y.com"),
        ]);
        let model = fx.view("git");
        assert_eq!(model.tab_count(), 1);
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].key, "github.com");
        assert_eq!(model.groups[0].count(), 1);
        assert_eq!(model.groups[0].tabs[0].tab.id, 1);
    }

    #[test]
    fn sessions_summarized_with_counts() {
        let fx = Fixture::new(vec![
            tab(1, 0, "a", "https://a.com"),
            tab(2, 1, "b", "https://b.com"),
        ]);
        let model = fx.view("");
        assert_eq!(model.sessions.len(), 1);
        assert!(model.sessions[0].active);
        assert_eq!(model.sessions[0].tab_count, 2);
        assert_eq!(model.active_session, model.sessions[0].id);
    }

    #[test]
    fn decorations_follow_ui_and_collapse_state() {
        let mut fx = Fixture::new(vec![tab(1, 0, "a", "https://a.com")]);
        let mut model = fx.view("");
        assert!(!model.groups[0].collapsed);

        fx.collapse.toggle("a.com");
        fx.ui.begin_edit(1, "https://a.com");
        redecorate(&mut model, &fx.collapse, &fx.ui);

        assert!(model.groups[0].collapsed);
        assert_eq!(
            model.groups[0].tabs[0].mode,
            TabMode::Editing("https://a.com".into())
        );
        assert_eq!(model, fx.view(""));
    }
}
