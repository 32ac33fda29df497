//! Keyed list diff.
//!
//! [`reconcile`] maps a previous key sequence onto a next one without touching
//! any DOM. Keys present in both are retained; among those, the ones lying on
//! a longest increasing subsequence of previous positions keep their place
//! and only the rest are marked as moved.

use std::collections::HashMap;
use std::hash::Hash;

/// What to do for one entry of the next list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// No previous row has this key.
    Create,
    /// Reuse the previous row at index `prev`.
    Retain { prev: usize, moved: bool },
}

/// Result of a reconcile: one action per next entry plus the dropped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPlan {
    pub actions: Vec<RowAction>,
    /// Previous indices with no counterpart in the next list, ascending.
    pub removed: Vec<usize>,
}

impl RowPlan {
    pub fn created(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, RowAction::Create))
            .count()
    }

    pub fn moved(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, RowAction::Retain { moved: true, .. }))
            .count()
    }

    /// True when applying the plan changes no structure at all.
    pub fn is_identity(&self) -> bool {
        self.removed.is_empty()
            && self
                .actions
                .iter()
                .all(|a| matches!(a, RowAction::Retain { moved: false, .. }))
    }
}

/// Diff `prev` against `next`.
///
/// `next` is expected to be free of duplicates; a repeated key is treated
/// as new after its first occurrence.
pub fn reconcile<K: Eq + Hash>(prev: &[K], next: &[K]) -> RowPlan {
    let prev_index: HashMap<&K, usize> = prev.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut claimed = vec![false; prev.len()];

    let mut matched: Vec<Option<usize>> = Vec::with_capacity(next.len());
    for key in next {
        let hit = prev_index.get(key).copied().filter(|&i| {
            let free = claimed.get(i).is_some_and(|c| !c);
            if free {
                if let Some(c) = claimed.get_mut(i) {
                    *c = true;
                }
            }
            free
        });
        matched.push(hit);
    }

    let retained: Vec<usize> = matched.iter().flatten().copied().collect();
    let stable = longest_increasing_subsequence(&retained);

    let mut stable_iter = stable.iter().peekable();
    let mut retained_pos = 0;
    let actions = matched
        .iter()
        .map(|hit| match hit {
            None => RowAction::Create,
            Some(prev) => {
                let on_lis = stable_iter.peek().is_some_and(|&&p| p == retained_pos);
                if on_lis {
                    stable_iter.next();
                }
                retained_pos += 1;
                RowAction::Retain {
                    prev: *prev,
                    moved: !on_lis,
                }
            }
        })
        .collect();

    let removed = claimed
        .iter()
        .enumerate()
        .filter_map(|(i, c)| (!c).then_some(i))
        .collect();

    RowPlan { actions, removed }
}

/// Positions (into `seq`) of one longest strictly increasing subsequence.
fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    // tails[k] = position of the smallest tail of an increasing run of length k+1
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, value) in seq.iter().enumerate() {
        let len = tails.partition_point(|&t| seq.get(t).is_some_and(|v| v < value));
        if len > 0 {
            if let Some(p) = predecessor.get_mut(i) {
                *p = tails.get(len - 1).copied();
            }
        }
        if len == tails.len() {
            tails.push(i);
        } else if let Some(slot) = tails.get_mut(len) {
            *slot = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut current = tails.last().copied();
    while let Some(i) = current {
        out.push(i);
        current = predecessor.get(i).copied().flatten();
    }
    out.reverse();
    out
}
