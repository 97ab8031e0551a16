// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session id -> live connection map.
//!
//! At most one handle is registered per session. A newer connection replaces
//! the older one, and only the handle currently stored can remove the entry,
//! so a late disconnect from a superseded socket never evicts its successor.

use dashmap::DashMap;

use crate::connection::ConnectionHandle;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    handles: DashMap<String, ConnectionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` for the session, returning the handle it replaced.
    pub fn register(&self, session_id: &str, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        self.handles.insert(session_id.to_string(), handle)
    }

    /// Remove the entry only if it still holds `handle`. Returns whether it did.
    pub fn unregister(&self, session_id: &str, handle: &ConnectionHandle) -> bool {
        self.handles
            .remove_if(session_id, |_, current| current.same_as(handle))
            .is_some()
    }

    pub fn lookup(&self, session_id: &str) -> Option<ConnectionHandle> {
        self.handles.get(session_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.handles.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove and return every registered handle.
    pub fn take_all(&self) -> Vec<ConnectionHandle> {
        let ids = self.session_ids();
        ids.iter()
            .filter_map(|id| self.handles.remove(id).map(|(_, handle)| handle))
            .collect()
    }
}
