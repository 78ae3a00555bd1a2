// Recent Path Service
// Read-side heuristics for the machine/path MRU list

use std::collections::HashSet;

use crate::models::{Machine, RecentMachinePath, Session};

/// Last-resort working directory when nothing is known about a machine.
pub const FALLBACK_HOME_DIR: &str = "/home/";

/// Best starting path for a machine, in priority order: the MRU list, then
/// the machine's session history, then its reported home directory, then
/// the global fallback.
pub fn best_path_for_machine(
    machine_id: Option<&str>,
    recents: &[RecentMachinePath],
    machines: &[Machine],
    sessions: &[Session],
) -> String {
    let machine_id = match machine_id {
        Some(id) => id,
        None => return FALLBACK_HOME_DIR.to_string(),
    };

    // The MRU list is already most-recent-first
    if let Some(entry) = recents.iter().find(|entry| entry.machine_id == machine_id) {
        return entry.path.clone();
    }

    // Session history: each path once, ranked by last activity
    let mut seen = HashSet::new();
    let mut ranked: Vec<(&str, i64)> = Vec::new();
    for session in sessions {
        let metadata = match &session.metadata {
            Some(metadata) => metadata,
            None => continue,
        };
        if metadata.machine_id.as_deref() != Some(machine_id) {
            continue;
        }
        if let Some(path) = metadata.path.as_deref() {
            if seen.insert(path) {
                ranked.push((path, session.last_activity_at()));
            }
        }
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some((path, _)) = ranked.first() {
        return path.to_string();
    }

    machines
        .iter()
        .find(|machine| machine.id == machine_id)
        .and_then(Machine::home_dir)
        .unwrap_or(FALLBACK_HOME_DIR)
        .to_string()
}

/// Machine to preselect for a new session: the most recently used machine
/// that is still known, else the first known machine.
pub fn pick_machine<'a>(
    recents: &[RecentMachinePath],
    machines: &'a [Machine],
) -> Option<&'a Machine> {
    for recent in recents {
        if let Some(machine) = machines.iter().find(|m| m.id == recent.machine_id) {
            return Some(machine);
        }
    }
    machines.first()
}
