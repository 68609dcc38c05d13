//! Provenance graph reconstruction over a batch's flat event log.
//!
//! The chain stores events as an append-only list where each event
//! references its parent by identifier. Everything here is a pure
//! function over one snapshot of that list: no I/O, no shared state,
//! safe to call concurrently. Malformed data (duplicate identifiers,
//! dangling parent references, cycles) degrades to a best-effort answer
//! and is surfaced through [`audit`] and operator logs, never through a
//! panic or an error return.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::Event;

/// An event materialized into the reconstructed tree, with its direct
/// children in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub event: Event,
    pub children: Vec<TreeNode>,
    /// Set when descent into this node was stopped because its identifier
    /// already appeared on the ancestor path.
    #[serde(default, skip_serializing_if = "is_false")]
    pub cycle_truncated: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Min/max/duration over the snapshot's timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    pub earliest: u64,
    pub latest: u64,
    pub duration: u64,
}

/// Out-degree summary of the reconstructed graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStatistics {
    /// Number of distinct identifiers referenced as a parent.
    pub total_branches: usize,
    /// Largest number of direct children behind one parent, 0 when no
    /// event references a parent.
    pub max_branching_factor: usize,
    /// Referenced parent identifier to its number of direct children.
    pub branching_points: HashMap<String, usize>,
}

/// Aggregate view of one batch's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_events: usize,
    /// Event type display name to count.
    pub event_type_counts: HashMap<String, usize>,
    pub participant_count: usize,
    /// `None` for an empty snapshot; callers must branch on
    /// `total_events` before relying on span fields.
    pub time_span: Option<TimeSpan>,
    pub branches: BranchStatistics,
}

/// Data-integrity finding in a batch snapshot. Warnings never stop a
/// query from answering; they exist so operators can spot upstream
/// corruption or a broken write path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum IntegrityWarning {
    DuplicateEventId { event_id: String },
    DanglingParent { event_id: String, parent_event_id: String },
    CycleDetected { event_id: String },
}

/// Reconstruct the parent/child forest from a flat, unordered event list.
///
/// Events whose parent reference is empty or does not resolve become
/// roots; sibling order is first-seen order in the input. Duplicate
/// identifiers resolve last-write-wins. A child whose identifier is
/// already on the current ancestor path is emitted as a cycle-terminated
/// leaf instead of being descended into.
pub fn build_tree(events: &[Event]) -> Vec<TreeNode> {
    let index = index_events(events);

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut roots: Vec<&str> = Vec::new();
    for event in events {
        match event.parent() {
            Some(parent) if index.contains_key(parent) => {
                children.entry(parent).or_default().push(&event.event_id);
            }
            _ => roots.push(&event.event_id),
        }
    }

    let mut path: HashSet<&str> = HashSet::new();
    roots
        .iter()
        .filter_map(|root_id| index.get(root_id).copied())
        .map(|root| build_node(root, &index, &children, &mut path))
        .collect()
}

fn build_node<'a>(
    event: &'a Event,
    index: &HashMap<&'a str, &'a Event>,
    children: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut HashSet<&'a str>,
) -> TreeNode {
    path.insert(&event.event_id);

    let mut child_nodes = Vec::new();
    for child_id in children.get(event.event_id.as_str()).into_iter().flatten() {
        let Some(child) = index.get(child_id).copied() else {
            continue;
        };
        if path.contains(child.event_id.as_str()) {
            warn!(
                "cycle in event log at {}; emitting truncated leaf",
                child.event_id
            );
            child_nodes.push(TreeNode {
                event: child.clone(),
                children: Vec::new(),
                cycle_truncated: true,
            });
        } else {
            child_nodes.push(build_node(child, index, children, path));
        }
    }

    path.remove(event.event_id.as_str());
    TreeNode {
        event: event.clone(),
        children: child_nodes,
        cycle_truncated: false,
    }
}

/// Walk parent references backward from `target_event_id` and return the
/// root-first path ending at the target.
///
/// Returns an empty vector when the target is not present. The walk
/// stops at an empty or unresolved parent reference, or at the first
/// identifier already visited in this walk.
pub fn find_path(events: &[Event], target_event_id: &str) -> Vec<Event> {
    let index = index_events(events);
    let Some(mut current) = index.get(target_event_id).copied() else {
        return Vec::new();
    };

    let mut path: Vec<Event> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    loop {
        if !visited.insert(&current.event_id) {
            warn!(
                "cycle in parent chain of {}; aborting walk at {}",
                target_event_id, current.event_id
            );
            break;
        }
        path.push(current.clone());
        match current.parent().and_then(|p| index.get(p)).copied() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    path.reverse();
    path
}

/// Aggregate counts, distinct participants, time span, and branching
/// factors over one snapshot.
pub fn compute_statistics(events: &[Event]) -> Statistics {
    let mut event_type_counts: HashMap<String, usize> = HashMap::new();
    let mut participants: HashSet<&str> = HashSet::new();
    for event in events {
        *event_type_counts
            .entry(event.event_type.display_name().to_string())
            .or_insert(0) += 1;
        participants.insert(&event.participant);
    }

    let time_span = if events.is_empty() {
        None
    } else {
        let earliest = events.iter().map(|e| e.timestamp).min().unwrap_or(0);
        let latest = events.iter().map(|e| e.timestamp).max().unwrap_or(0);
        Some(TimeSpan {
            earliest,
            latest,
            duration: latest - earliest,
        })
    };

    let mut branching_points: HashMap<String, usize> = HashMap::new();
    for event in events {
        if let Some(parent) = event.parent() {
            *branching_points.entry(parent.to_string()).or_insert(0) += 1;
        }
    }
    // Zero floor is deliberate: a batch with only a root has no branches.
    let max_branching_factor = branching_points.values().copied().max().unwrap_or(0);

    Statistics {
        total_events: events.len(),
        event_type_counts,
        participant_count: participants.len(),
        time_span,
        branches: BranchStatistics {
            total_branches: branching_points.len(),
            max_branching_factor,
            branching_points,
        },
    }
}

/// Scan a snapshot for integrity problems without altering any query
/// result: duplicate identifiers, dangling parent references, and
/// cycles in the parent chain.
pub fn audit(events: &[Event]) -> Vec<IntegrityWarning> {
    let mut warnings = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    for event in events {
        if !seen.insert(&event.event_id) {
            warnings.push(IntegrityWarning::DuplicateEventId {
                event_id: event.event_id.clone(),
            });
        }
    }

    let index = index_events(events);
    for event in events {
        if let Some(parent) = event.parent() {
            if !index.contains_key(parent) {
                warnings.push(IntegrityWarning::DanglingParent {
                    event_id: event.event_id.clone(),
                    parent_event_id: parent.to_string(),
                });
            }
        }
    }

    // Parent edges form a functional graph; color-walk it once to find
    // every identifier sitting on a cycle.
    let mut state: HashMap<&str, u8> = HashMap::new();
    for start in index.keys().copied() {
        if state.contains_key(start) {
            continue;
        }
        let mut chain: Vec<&str> = Vec::new();
        let mut current = start;
        loop {
            state.insert(current, 1);
            chain.push(current);
            let next = index
                .get(current)
                .and_then(|e| e.parent())
                .and_then(|p| index.get(p))
                .map(|e| e.event_id.as_str());
            match next {
                Some(parent) if !state.contains_key(parent) => current = parent,
                Some(parent) if state.get(parent) == Some(&1) => {
                    let entry = chain.iter().position(|id| *id == parent).unwrap_or(0);
                    for id in &chain[entry..] {
                        warnings.push(IntegrityWarning::CycleDetected {
                            event_id: (*id).to_string(),
                        });
                    }
                    break;
                }
                _ => break,
            }
        }
        for id in chain {
            state.insert(id, 2);
        }
    }

    warnings
}

/// Index a snapshot by identifier, last write winning on duplicates.
fn index_events(events: &[Event]) -> HashMap<&str, &Event> {
    let mut index: HashMap<&str, &Event> = HashMap::new();
    for event in events {
        if index.insert(&event.event_id, event).is_some() {
            warn!("duplicate event id in snapshot: {}", event.event_id);
        }
    }
    index
}
