use std::collections::HashSet;

use tracing::{debug, info};
use uuid::Uuid;

use crate::io::kv_store::{KeyValueStore, session_key};
use crate::model::session::{Session, SessionId, SessionRecord};
use crate::model::tab::{TabId, WindowId};

use super::{LoadStatus, SaveStatus, load_record, save_record};

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
}

/// Owns the session set, active session, and tab membership of one window.
///
/// `tab_session` is the membership truth. After `reconcile_membership` it
/// holds exactly the live tabs, each mapped to an existing session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    window_id: WindowId,
    record: SessionRecord,
    default_title: String,
    load_status: LoadStatus,
    save_status: SaveStatus,
}

impl SessionStore {
    /// Empty store for a window, not backed by anything persisted yet
    pub fn new(window_id: WindowId, default_title: &str) -> Self {
        SessionStore {
            window_id,
            record: SessionRecord::default(),
            default_title: default_title.to_string(),
            load_status: LoadStatus::Missing,
            save_status: SaveStatus::Clean,
        }
    }

    /// Load the window's record. Missing or unreadable data yields an empty store.
    pub fn load(window_id: WindowId, kv: &dyn KeyValueStore, default_title: &str) -> Self {
        let (record, load_status) = load_record(kv, &session_key(window_id));
        SessionStore {
            window_id,
            record,
            default_title: default_title.to_string(),
            load_status,
            save_status: SaveStatus::Clean,
        }
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn sessions(&self) -> &[Session] {
        &self.record.sessions
    }

    pub fn active_id(&self) -> &str {
        &self.record.active_session_id
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    pub fn session_of(&self, tab: TabId) -> Option<&SessionId> {
        self.record.session_of(tab)
    }

    /// Materialize a default session and make sure one session is active.
    /// Returns true when anything changed. Idempotent.
    pub fn ensure_default_session(&mut self) -> bool {
        if self.record.sessions.is_empty() {
            let id = self.fresh_id();
            self.record.sessions.push(Session {
                id: id.clone(),
                title: self.default_title.clone(),
            });
            self.record.active_session_id = id;
            debug!(window = self.window_id, "created default session");
            return true;
        }
        let active = &self.record.active_session_id;
        if active.is_empty() || !self.record.contains(active) {
            self.record.active_session_id = self.record.sessions[0].id.clone();
            return true;
        }
        false
    }

    /// Repair membership against the live tab list.
    ///
    /// Drops entries for closed tabs, assigns unseen tabs to the active
    /// session, and re-homes entries that point at unknown sessions.
    /// Returns true when the record changed.
    pub fn reconcile_membership(&mut self, live: &[TabId]) -> bool {
        let mut changed = self.ensure_default_session();
        let live_keys: HashSet<String> = live.iter().map(|id| id.to_string()).collect();

        let before = self.record.tab_session.len();
        self.record.tab_session.retain(|key, _| live_keys.contains(key));
        let pruned = before - self.record.tab_session.len();

        let active = self.record.active_session_id.clone();
        let mut assigned = 0;
        for key in live_keys {
            let homed = self
                .record
                .tab_session
                .get(&key)
                .is_some_and(|sid| self.record.contains(sid));
            if !homed {
                self.record.tab_session.insert(key, active.clone());
                assigned += 1;
            }
        }

        if pruned > 0 || assigned > 0 {
            debug!(window = self.window_id, pruned, assigned, "membership repaired");
            changed = true;
        }
        changed
    }

    /// Append a session, make it active, and persist. Returns the new id.
    pub fn create_session(&mut self, title: &str, kv: &mut dyn KeyValueStore) -> SessionId {
        let id = self.fresh_id();
        self.record.sessions.push(Session {
            id: id.clone(),
            title: title.to_string(),
        });
        self.record.active_session_id = id.clone();
        info!(window = self.window_id, session = %id, title, "session created");
        self.save(kv);
        id
    }

    pub fn rename_session(
        &mut self,
        id: &str,
        title: &str,
        kv: &mut dyn KeyValueStore,
    ) -> Result<(), SessionError> {
        let session = self
            .record
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        session.title = title.to_string();
        self.save(kv);
        Ok(())
    }

    /// Switch the active session. Callers follow with `reconcile_membership`.
    pub fn set_active(&mut self, id: &str, kv: &mut dyn KeyValueStore) -> Result<(), SessionError> {
        if !self.record.contains(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }
        self.record.active_session_id = id.to_string();
        self.save(kv);
        Ok(())
    }

    /// Remove a session and return the tabs that belonged to it.
    ///
    /// The caller requests closure of the returned tabs. If the closed session
    /// was active, the first remaining session (or a fresh default) takes over.
    pub fn close_session(
        &mut self,
        id: &str,
        kv: &mut dyn KeyValueStore,
    ) -> Result<Vec<TabId>, SessionError> {
        let pos = self
            .record
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let members = self.record.tabs_in(id);
        self.record.sessions.remove(pos);
        self.record.tab_session.retain(|_, sid| sid.as_str() != id);

        if self.record.active_session_id == id {
            self.record.active_session_id.clear();
        }
        self.ensure_default_session();

        info!(
            window = self.window_id,
            session = id,
            tabs = members.len(),
            "session closed"
        );
        self.save(kv);
        Ok(members)
    }

    /// Best-effort write of the current record
    pub fn save(&mut self, kv: &mut dyn KeyValueStore) -> &SaveStatus {
        self.save_status = save_record(kv, &session_key(self.window_id), &self.record);
        &self.save_status
    }

    fn fresh_id(&self) -> SessionId {
        loop {
            let id = format!("s-{}", Uuid::new_v4().simple());
            if !self.record.contains(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::kv_store::MemoryStore;
    use serde_json::json;

    fn store_with(titles: &[&str], kv: &mut MemoryStore) -> (SessionStore, Vec<SessionId>) {
        let mut store = SessionStore::load(1, kv, "default");
        let ids = titles.iter().map(|t| store.create_session(t, kv)).collect();
        (store, ids)
    }

    #[test]
    fn default_session_created_once() {
        let mut store = SessionStore::new(1, "default");
        assert!(store.ensure_default_session());
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].title, "default");
        assert_eq!(store.active_id(), store.sessions()[0].id);

        assert!(!store.ensure_default_session());
        assert_eq!(store.sessions().len(), 1);
    }

    #[test]
    fn unset_active_falls_back_to_first() {
        let mut kv = MemoryStore::new();
        kv.insert_raw(
            &session_key(1),
            json!({"sessions": [{"id": "a", "title": "A"}, {"id": "b", "title": "B"}]}),
        );
        let mut store = SessionStore::load(1, &kv, "default");
        assert_eq!(store.load_status(), &LoadStatus::Loaded);
        assert!(store.ensure_default_session());
        assert_eq!(store.active_id(), "a");
    }

    #[test]
    fn dangling_active_is_repaired() {
        let mut kv = MemoryStore::new();
        kv.insert_raw(
            &session_key(1),
            json!({"sessions": [{"id": "a", "title": "A"}], "activeSessionId": "gone"}),
        );
        let mut store = SessionStore::load(1, &kv, "default");
        store.ensure_default_session();
        assert_eq!(store.active_id(), "a");
    }

    #[test]
    fn corrupt_record_loads_empty() {
        let mut kv = MemoryStore::new();
        kv.insert_raw(&session_key(1), json!({"sessions": "nope"}));
        let store = SessionStore::load(1, &kv, "default");
        assert!(matches!(store.load_status(), LoadStatus::Corrupt(_)));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn read_failure_loads_empty() {
        let mut kv = MemoryStore::new();
        kv.fail_reads = true;
        let store = SessionStore::load(1, &kv, "default");
        assert!(matches!(store.load_status(), LoadStatus::Unavailable(_)));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn membership_matches_live_tabs() {
        let mut kv = MemoryStore::new();
        let (mut store, ids) = store_with(&["work"], &mut kv);
        store.reconcile_membership(&[1, 2, 3]);
        assert!(store.record().tab_session.values().all(|s| *s == ids[0]));

        store.reconcile_membership(&[2, 3, 4]);
        let keys: Vec<&str> = store.record().tab_session.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2", "3", "4"]);
        for sid in store.record().tab_session.values() {
            assert!(store.record().contains(sid));
        }
    }

    #[test]
    fn new_tabs_join_active_session() {
        let mut kv = MemoryStore::new();
        let (mut store, ids) = store_with(&["a", "b"], &mut kv);
        store.set_active(&ids[0], &mut kv).unwrap();
        store.reconcile_membership(&[1]);
        store.set_active(&ids[1], &mut kv).unwrap();
        store.reconcile_membership(&[1, 2]);

        assert_eq!(store.session_of(1), Some(&ids[0]));
        assert_eq!(store.session_of(2), Some(&ids[1]));
    }

    #[test]
    fn entries_for_unknown_sessions_rehomed() {
        let mut kv = MemoryStore::new();
        kv.insert_raw(
            &session_key(1),
            json!({
                "sessions": [{"id": "a", "title": "A"}],
                "activeSessionId": "a",
                "tabSession": {"5": "ghost"}
            }),
        );
        let mut store = SessionStore::load(1, &kv, "default");
        assert!(store.reconcile_membership(&[5]));
        assert_eq!(store.session_of(5).map(String::as_str), Some("a"));
        assert!(!store.reconcile_membership(&[5]));
    }

    #[test]
    fn close_active_session_reassigns_and_returns_members() {
        let mut kv = MemoryStore::new();
        let (mut store, ids) = store_with(&["A", "B"], &mut kv);
        let (a, b) = (ids[0].clone(), ids[1].clone());

        store.set_active(&b, &mut kv).unwrap();
        store.reconcile_membership(&[3]);
        store.set_active(&a, &mut kv).unwrap();
        store.reconcile_membership(&[1, 2, 3]);

        let members = store.close_session(&a, &mut kv).unwrap();
        assert_eq!(members, vec![1, 2]);
        assert_eq!(store.active_id(), b);
        assert!(store.record().tab_session.values().all(|s| *s == b));
        assert!(!store.record().contains(&a));
    }

    #[test]
    fn closing_last_session_synthesizes_default() {
        let mut kv = MemoryStore::new();
        let (mut store, ids) = store_with(&["only"], &mut kv);
        store.close_session(&ids[0], &mut kv).unwrap();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].title, "default");
        assert_eq!(store.active_id(), store.sessions()[0].id);
    }

    #[test]
    fn unknown_session_operations_fail() {
        let mut kv = MemoryStore::new();
        let mut store = SessionStore::new(1, "default");
        assert!(store.set_active("nope", &mut kv).is_err());
        assert!(store.rename_session("nope", "x", &mut kv).is_err());
        assert!(store.close_session("nope", &mut kv).is_err());
    }

    #[test]
    fn rename_and_persist_round_trip() {
        let mut kv = MemoryStore::new();
        let (mut store, ids) = store_with(&["draft"], &mut kv);
        store.rename_session(&ids[0], "research", &mut kv).unwrap();
        assert_eq!(store.save_status(), &SaveStatus::Saved);

        let reloaded = SessionStore::load(1, &kv, "default");
        assert_eq!(reloaded.sessions()[0].title, "research");
        assert_eq!(reloaded.active_id(), ids[0]);
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let mut kv = MemoryStore::new();
        kv.fail_writes = true;
        let mut store = SessionStore::new(1, "default");
        let id = store.create_session("offline", &mut kv);
        assert!(store.save_status().is_failed());
        assert_eq!(store.active_id(), id);
    }
}
