//! The tab organization engine.
//!
//! `Engine` is the single writer for everything derived from the live tab
//! list: the window's session and collapse stores, transient interaction
//! state, and the last render model. Every pass re-reads the platform and
//! re-derives from scratch, so overlapping or repeated passes converge on
//! whatever the platform most recently reported.

pub mod events;
pub mod intents;
pub mod ui_state;
pub mod view;

pub use events::EventPump;
pub use intents::Outcome;
pub use ui_state::{EditState, UiState};

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::host::{Host, HostError};
use crate::io::kv_store::KeyValueStore;
use crate::model::config::EngineConfig;
use crate::model::tab::{Tab, TabId, WindowId};
use crate::model::view::RenderModel;
use crate::ops::grouping::OriginGrouper;
use crate::store::{CollapseStore, SessionStore};

use view::{ViewInputs, build_view, redecorate};

/// Session and collapse stores for the engine's window
#[derive(Debug, Clone)]
pub struct WindowStores {
    pub sessions: SessionStore,
    pub collapse: CollapseStore,
}

impl WindowStores {
    pub fn load(window_id: WindowId, kv: &dyn KeyValueStore, default_title: &str) -> Self {
        WindowStores {
            sessions: SessionStore::load(window_id, kv, default_title),
            collapse: CollapseStore::load(window_id, kv),
        }
    }

    pub fn window_id(&self) -> WindowId {
        self.sessions.window_id()
    }
}

pub struct Engine<H: Host, S: KeyValueStore> {
    host: H,
    kv: S,
    config: EngineConfig,
    grouper: OriginGrouper,
    window: Option<WindowId>,
    stores: Option<WindowStores>,
    ui: UiState,
    filter: String,
    model: RenderModel,
}

impl<H: Host, S: KeyValueStore> Engine<H, S> {
    /// Engine that follows whichever window is current at the first refresh
    pub fn new(host: H, kv: S, config: EngineConfig) -> Self {
        Engine {
            grouper: OriginGrouper::new(&config.extra_internal_schemes),
            host,
            kv,
            config,
            window: None,
            stores: None,
            ui: UiState::default(),
            filter: String::new(),
            model: RenderModel::default(),
        }
    }

    /// Engine pinned to a specific window
    pub fn for_window(host: H, kv: S, config: EngineConfig, window: WindowId) -> Self {
        let mut engine = Self::new(host, kv, config);
        engine.window = Some(window);
        engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window_id(&self) -> Option<WindowId> {
        self.window
    }

    pub fn stores(&self) -> Option<&WindowStores> {
        self.stores.as_ref()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The last successfully derived render model
    pub fn model(&self) -> &RenderModel {
        &self.model
    }

    /// Change the text filter and re-derive.
    pub fn set_filter(&mut self, text: &str) -> &RenderModel {
        self.filter = text.trim().to_string();
        self.refresh()
    }

    /// Forget the cached stores so the next refresh reads them back from the
    /// key-value store. Needed when another process may have written them.
    pub fn reload_stores(&mut self) {
        self.stores = None;
    }

    /// Re-read the platform, repair the stores, and rebuild the render model.
    ///
    /// Never fails: if the platform cannot be read, the previous model stays
    /// in place and the failure is logged.
    pub fn refresh(&mut self) -> &RenderModel {
        match self.derive() {
            Ok(model) => self.model = model,
            Err(e) => warn!(error = %e, "refresh failed, keeping previous view"),
        }
        &self.model
    }

    fn derive(&mut self) -> Result<RenderModel, HostError> {
        let window = self.resolve_window()?;
        let tabs = self.host.query(window)?;
        let live: Vec<TabId> = tabs.iter().map(|t| t.id).collect();

        if self.stores.as_ref().map(WindowStores::window_id) != Some(window) {
            self.stores = Some(WindowStores::load(
                window,
                &self.kv,
                &self.config.default_session_title,
            ));
        }
        let Some(stores) = self.stores.as_mut() else {
            return Err(HostError::WindowNotFound(window));
        };

        if stores.sessions.reconcile_membership(&live) {
            stores.sessions.save(&mut self.kv);
        }

        let group_keys: HashSet<String> =
            tabs.iter().map(|t| self.grouper.group_key(t)).collect();
        if stores.collapse.retain_groups(&group_keys) {
            stores.collapse.save(&mut self.kv);
        }

        let live_set: HashSet<TabId> = live.into_iter().collect();
        self.ui.retain_tabs(&live_set);

        debug!(window, tabs = tabs.len(), "refresh");
        Ok(build_view(&ViewInputs {
            window_id: window,
            tabs: &tabs,
            sessions: &stores.sessions,
            collapse: &stores.collapse,
            ui: &self.ui,
            grouper: &self.grouper,
            filter: &self.filter,
        }))
    }

    /// The engine's window, asking the platform on first use.
    fn resolve_window(&mut self) -> Result<WindowId, HostError> {
        match self.window {
            Some(w) => Ok(w),
            None => {
                let w = self.host.current()?;
                self.window = Some(w);
                Ok(w)
            }
        }
    }

    /// Stores for the engine's window (loading them on first use) alongside
    /// the persistence backend.
    fn stores_and_kv(&mut self) -> Result<(&mut WindowStores, &mut S), HostError> {
        let window = self.resolve_window()?;
        if self.stores.as_ref().map(WindowStores::window_id) != Some(window) {
            self.stores = Some(WindowStores::load(
                window,
                &self.kv,
                &self.config.default_session_title,
            ));
        }
        match self.stores.as_mut() {
            Some(stores) => Ok((stores, &mut self.kv)),
            None => Err(HostError::WindowNotFound(window)),
        }
    }

    /// Fresh copy of a tab in the engine's window
    fn find_tab(&mut self, id: TabId) -> Result<Option<Tab>, HostError> {
        let window = self.resolve_window()?;
        Ok(self.host.query(window)?.into_iter().find(|t| t.id == id))
    }

    /// Apply interaction or collapse changes to the current model in place
    fn redraw(&mut self) {
        if let Some(stores) = &self.stores {
            redecorate(&mut self.model, &stores.collapse, &self.ui);
        }
    }
}
