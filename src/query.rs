//! Presence Queries
//!
//! Aggregations over entries that have already passed verification.

use std::collections::{BTreeMap, BTreeSet};

use crate::audit::entry::{Action, LogEntry};

/// Actors whose latest event in `room` is an `enter`.
pub fn present_in_room(entries: &[LogEntry], room: &str) -> BTreeSet<String> {
    let mut inside: BTreeMap<&str, bool> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.room == room) {
        match entry.action() {
            Some(Action::Enter) => {
                inside.insert(entry.actor.as_str(), true);
            }
            Some(Action::Exit) => {
                inside.insert(entry.actor.as_str(), false);
            }
            None => {}
        }
    }

    inside
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(actor, _)| actor.to_string())
        .collect()
}

/// Rooms `actor` is currently inside.
pub fn rooms_for_actor(entries: &[LogEntry], actor: &str) -> BTreeSet<String> {
    let mut rooms = BTreeSet::new();
    for entry in entries.iter().filter(|e| e.actor == actor) {
        match entry.action() {
            Some(Action::Enter) => {
                rooms.insert(entry.room.clone());
            }
            Some(Action::Exit) => {
                rooms.remove(&entry.room);
            }
            None => {}
        }
    }
    rooms
}
