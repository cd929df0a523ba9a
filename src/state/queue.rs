//! Local mirror of the venue's waiting queue.
//!
//! The backend only knows positions. Each entry gets a local [`Uuid`] that
//! survives polls as long as the same name is still found in order, so callers
//! can target a player without racing against the next poll.

use std::collections::HashMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::IdempotencyKey;

/// Queue entry as displayed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: Uuid,
    /// Zero-based waiting position.
    pub position: usize,
    /// Displayed name, including an in-flight rename.
    pub name: String,
    /// True while a rename of this entry awaits the backend.
    pub pending: bool,
}

/// Ticket taken before fetching the remote queue; orders concurrent refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone)]
struct PendingRename {
    key: IdempotencyKey,
    name: String,
}

/// Ordered waiting list plus the alert shown to the admin.
#[derive(Debug, Default)]
pub struct QueueStore {
    /// Names as last confirmed by the backend, in waiting order.
    entries: IndexMap<Uuid, String>,
    renames: HashMap<Uuid, PendingRename>,
    alert: Option<String>,
    issued: u64,
    applied: u64,
    stale_through: u64,
}

impl QueueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of waiting players.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the queue in waiting order.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, (id, name))| self.display(position, *id, name))
            .collect()
    }

    /// Current position of the entry `id`.
    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.entries.get_index_of(&id)
    }

    /// The two players at the front of the queue.
    pub fn front_pair(&self) -> Option<(QueueEntry, QueueEntry)> {
        let (first_id, first) = self.entries.get_index(0)?;
        let (second_id, second) = self.entries.get_index(1)?;
        Some((
            self.display(0, *first_id, first),
            self.display(1, *second_id, second),
        ))
    }

    /// Alert currently shown, if any.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Show `message` until dismissed or until the next confirmed mutation.
    pub fn set_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    /// Clear the alert, returning whether one was shown.
    pub fn clear_alert(&mut self) -> bool {
        self.alert.take().is_some()
    }

    /// Take a ticket before fetching the remote queue.
    pub fn issue_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Replace the queue with the backend's answer for `ticket`.
    ///
    /// Returns `false` (and changes nothing) when a newer refresh was already
    /// applied or a mutation was confirmed after the ticket was issued.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, names: Vec<String>) -> bool {
        if ticket.0 <= self.stale_through || ticket.0 <= self.applied {
            return false;
        }

        self.applied = ticket.0;
        let next = reconcile(&self.entries, &self.renames, names);
        self.renames
            .retain(|id, pending| next.get(id).is_some_and(|name| *name != pending.name));
        self.entries = next;
        true
    }

    /// Invalidate every refresh issued so far; their answers predate the mutation.
    pub fn mark_mutation_confirmed(&mut self) {
        self.stale_through = self.issued;
    }

    /// Show `name` for `id` until the backend answers. Returns `false` for unknown ids.
    pub fn begin_rename(&mut self, id: Uuid, name: String, key: IdempotencyKey) -> bool {
        if !self.entries.contains_key(&id) {
            return false;
        }
        self.renames.insert(id, PendingRename { key, name });
        true
    }

    /// Settle the rename issued with `key`: fold it in on success, revert it otherwise.
    pub fn finish_rename(&mut self, id: Uuid, key: IdempotencyKey, succeeded: bool) -> bool {
        let Some(pending) = self.renames.get(&id) else {
            return false;
        };
        if pending.key != key {
            return false;
        }

        let Some(pending) = self.renames.remove(&id) else {
            return false;
        };
        if succeeded {
            if let Some(name) = self.entries.get_mut(&id) {
                *name = pending.name;
            }
            self.mark_mutation_confirmed();
        }
        true
    }

    /// Drop an entry the backend confirmed as deleted.
    pub fn confirm_removal(&mut self, id: Uuid) -> bool {
        self.renames.remove(&id);
        let removed = self.entries.shift_remove(&id).is_some();
        self.mark_mutation_confirmed();
        removed
    }

    fn display(&self, position: usize, id: Uuid, name: &str) -> QueueEntry {
        match self.renames.get(&id) {
            Some(pending) => QueueEntry {
                id,
                position,
                name: pending.name.clone(),
                pending: true,
            },
            None => QueueEntry {
                id,
                position,
                name: name.to_string(),
                pending: false,
            },
        }
    }
}

/// Carry identifiers over from `previous` to the entries of `names` that are
/// still found in the same relative order.
///
/// An entry also matches under the name of its pending rename, so a poll that
/// lands after the backend applied the rename keeps the entry's identifier.
fn reconcile(
    previous: &IndexMap<Uuid, String>,
    renames: &HashMap<Uuid, PendingRename>,
    names: Vec<String>,
) -> IndexMap<Uuid, String> {
    let mut next = IndexMap::with_capacity(names.len());
    let mut cursor = 0;

    for name in names {
        let matched = previous.get_range(cursor..).and_then(|rest| {
            rest.iter().position(|(id, existing)| {
                *existing == name || renames.get(id).is_some_and(|pending| pending.name == name)
            })
        });
        let id = match matched {
            Some(offset) => {
                let index = cursor + offset;
                cursor = index + 1;
                previous
                    .get_index(index)
                    .map(|(id, _)| *id)
                    .unwrap_or_else(Uuid::new_v4)
            }
            None => Uuid::new_v4(),
        };
        next.insert(id, name);
    }

    next
}
