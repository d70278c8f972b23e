//! Display ordering for folder listings and reconciliation with persisted orders.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::types::{FileStat, SortBy};

use super::util::{extname, natural_cmp_name};

/// Order `entries` for display.
///
/// With a non-empty `order`, names it lists come first in that order and the rest keep
/// their incoming order. Without one, folders precede files and both sort naturally by name.
pub fn sort_contents(entries: Vec<(String, FileStat)>, order: &[String]) -> Vec<(String, FileStat)> {
    if order.is_empty() {
        return sort_by(entries, SortBy::Name, true);
    }

    let mut remaining = entries;
    let mut sorted = Vec::with_capacity(remaining.len());
    for name in order {
        if let Some(idx) = remaining.iter().position(|(entry, _)| entry == name) {
            sorted.push(remaining.remove(idx));
        }
    }
    sorted.extend(remaining);
    sorted
}

/// Folders first, then files, each ordered by `key`.
pub fn sort_by(entries: Vec<(String, FileStat)>, key: SortBy, ascending: bool) -> Vec<(String, FileStat)> {
    let (mut folders, mut files): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|(_, stat)| stat.is_dir);

    let compare = |a: &(String, FileStat), b: &(String, FileStat)| {
        let ordering = compare_by(key, a, b);
        if ascending { ordering } else { ordering.reverse() }
    };
    folders.sort_by(compare);
    files.sort_by(compare);

    folders.extend(files);
    folders
}

fn compare_by(key: SortBy, (a_name, a): &(String, FileStat), (b_name, b): &(String, FileStat)) -> Ordering {
    let by_name = || natural_cmp_name(a_name, b_name);
    match key {
        SortBy::Name => by_name(),
        SortBy::Size => a.size.cmp(&b.size).then_with(by_name),
        SortBy::Date => a.modified_ms.cmp(&b.modified_ms).then_with(by_name),
        SortBy::Type => extname(a_name)
            .to_lowercase()
            .cmp(&extname(b_name).to_lowercase())
            .then_with(by_name),
    }
}

/// Outcome of comparing live listing names with a persisted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortReconciliation {
    /// One name was swapped for another: the rewritten order keeps its position.
    Rename { from: String, to: String, order: Vec<String> },
    /// Same members, different sequence: the listing should adopt the persisted order.
    Reorder,
    InSync,
    /// Entries were added or removed; ordering falls back to the natural sort.
    Structural,
}

pub fn reconcile_sort_order(names: &[String], persisted: &[String]) -> SortReconciliation {
    if persisted.is_empty() || names.len() != persisted.len() {
        return SortReconciliation::Structural;
    }

    let live: HashSet<&str> = names.iter().map(String::as_str).collect();
    let known: HashSet<&str> = persisted.iter().map(String::as_str).collect();
    let added: Vec<&str> = names.iter().map(String::as_str).filter(|n| !known.contains(n)).collect();
    let removed: Vec<&str> =
        persisted.iter().map(String::as_str).filter(|n| !live.contains(n)).collect();

    match (added.as_slice(), removed.as_slice()) {
        ([], []) => {
            if names == persisted {
                SortReconciliation::InSync
            } else {
                SortReconciliation::Reorder
            }
        }
        ([to], [from]) => SortReconciliation::Rename {
            from: from.to_string(),
            to: to.to_string(),
            order: persisted
                .iter()
                .map(|entry| if entry == from { to.to_string() } else { entry.clone() })
                .collect(),
        },
        _ => SortReconciliation::Structural,
    }
}
