use std::collections::HashSet;

use crate::io::kv_store::{KeyValueStore, collapse_key};
use crate::model::session::CollapseRecord;
use crate::model::tab::WindowId;

use super::{LoadStatus, SaveStatus, load_record, save_record};

/// Per-group collapsed flags for one window
#[derive(Debug, Clone)]
pub struct CollapseStore {
    window_id: WindowId,
    flags: CollapseRecord,
    load_status: LoadStatus,
    save_status: SaveStatus,
}

impl CollapseStore {
    pub fn load(window_id: WindowId, kv: &dyn KeyValueStore) -> Self {
        let (flags, load_status) = load_record(kv, &collapse_key(window_id));
        CollapseStore {
            window_id,
            flags,
            load_status,
            save_status: SaveStatus::Clean,
        }
    }

    pub fn is_collapsed(&self, group_key: &str) -> bool {
        self.flags.get(group_key).copied().unwrap_or(false)
    }

    /// Flip a group's flag. Returns the new collapsed state.
    pub fn toggle(&mut self, group_key: &str) -> bool {
        let collapsed = !self.is_collapsed(group_key);
        if collapsed {
            self.flags.insert(group_key.to_string(), true);
        } else {
            self.flags.remove(group_key);
        }
        collapsed
    }

    /// Drop flags for groups that no longer exist. Returns true if any were dropped.
    pub fn retain_groups(&mut self, live_keys: &HashSet<String>) -> bool {
        let before = self.flags.len();
        self.flags.retain(|key, _| live_keys.contains(key));
        self.flags.len() != before
    }

    pub fn save(&mut self, kv: &mut dyn KeyValueStore) -> &SaveStatus {
        self.save_status = save_record(kv, &collapse_key(self.window_id), &self.flags);
        &self.save_status
    }

    pub fn flags(&self) -> &CollapseRecord {
        &self.flags
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }
}
