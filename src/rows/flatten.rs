//! Resource hierarchy flattening.
//!
//! Resources arrive as a forest, with nesting expressed through `children`,
//! through `parent_id`, or both. Rendering needs one ordered list: depth
//! first, children right after their parent, siblings in declared order.

use std::collections::{HashMap, HashSet};

use crate::types::Resource;

/// One visible row after flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatResource<'a> {
    pub resource: &'a Resource,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    /// Per spreadsheet column: cells spanned, 0 when merged into a row above.
    pub row_spans: Vec<usize>,
}

/// Expand/collapse state keyed by resource id.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    default_expanded: bool,
    overrides: HashMap<String, bool>,
}

impl ExpansionState {
    pub fn new(default_expanded: bool) -> Self {
        Self {
            default_expanded,
            overrides: HashMap::new(),
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.overrides
            .get(id)
            .copied()
            .unwrap_or(self.default_expanded)
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) {
        self.overrides.insert(id.to_string(), expanded);
    }

    /// Flip the state of `id`, returning the new value.
    pub fn toggle(&mut self, id: &str) -> bool {
        let next = !self.is_expanded(id);
        self.set_expanded(id, next);
        next
    }

    /// Forget overrides, e.g. after `resourcesInitiallyExpanded` changed.
    pub fn reset(&mut self, default_expanded: bool) {
        self.default_expanded = default_expanded;
        self.overrides.clear();
    }
}

struct Entry<'a> {
    resource: &'a Resource,
    parent: Option<&'a str>,
}

fn collect<'a>(
    resources: &'a [Resource],
    parent: Option<&'a str>,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<Entry<'a>>,
) {
    for resource in resources {
        if !seen.insert(resource.id.as_str()) {
            tracing::warn!(id = %resource.id, "duplicate resource id dropped");
            continue;
        }
        let parent = parent.or(resource.parent_id.as_deref());
        out.push(Entry { resource, parent });
        collect(&resource.children, Some(resource.id.as_str()), seen, out);
    }
}

/// Flatten `resources` into display order.
///
/// A `parent_id` that names no known resource, or that would close a cycle,
/// leaves the resource at the top level. Descendants of collapsed resources
/// are omitted. Row spans are left empty; see [`compute_row_spans`].
pub fn flatten_resources<'a>(
    resources: &'a [Resource],
    expansion: &ExpansionState,
) -> Vec<FlatResource<'a>> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    collect(resources, None, &mut seen, &mut entries);

    let index_of: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.resource.id.as_str(), i))
        .collect();

    let parent_index: Vec<Option<usize>> = entries
        .iter()
        .map(|e| e.parent.and_then(|p| index_of.get(p).copied()))
        .collect();

    let mut roots = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, (entry, parent)) in entries.iter().zip(&parent_index).enumerate() {
        match parent {
            Some(p) if !closes_cycle(i, &parent_index) => children.entry(*p).or_default().push(i),
            Some(_) => {
                tracing::warn!(id = %entry.resource.id, "resource parent cycle, rendering at top level");
                roots.push(i);
            }
            None => roots.push(i),
        }
    }

    let mut out = Vec::with_capacity(entries.len());
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&i| (i, 0)).collect();
    while let Some((i, depth)) = stack.pop() {
        let Some(entry) = entries.get(i) else {
            continue;
        };
        let kids = children.get(&i).map_or(&[][..], Vec::as_slice);
        let expanded = expansion.is_expanded(&entry.resource.id);
        out.push(FlatResource {
            resource: entry.resource,
            depth,
            has_children: !kids.is_empty(),
            expanded,
            row_spans: Vec::new(),
        });
        if expanded {
            stack.extend(kids.iter().rev().map(|&k| (k, depth + 1)));
        }
    }
    out
}

/// Whether following parents from `start` returns to `start`.
fn closes_cycle(start: usize, parent_index: &[Option<usize>]) -> bool {
    let mut current = parent_index.get(start).copied().flatten();
    let mut steps = 0;
    while let Some(i) = current {
        if i == start {
            return true;
        }
        steps += 1;
        if steps > parent_index.len() {
            // A cycle further up that does not include `start`.
            return false;
        }
        current = parent_index.get(i).copied().flatten();
    }
    false
}

/// Fill `row_spans` for every row.
///
/// `group_fields` holds one entry per column: `Some(field)` for a group
/// column, `None` for a plain one. A group column merges consecutive rows
/// with the same field value, without crossing the boundary of a merge made
/// by a group column to its left.
pub fn compute_row_spans(rows: &mut [FlatResource<'_>], group_fields: &[Option<&str>]) {
    for row in rows.iter_mut() {
        row.row_spans = vec![1; group_fields.len()];
    }

    // Indices at which a merged run must end, from columns already processed.
    let mut boundaries: HashSet<usize> = HashSet::new();
    for (col, field) in group_fields.iter().enumerate() {
        let Some(field) = field else {
            continue;
        };
        let values: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.resource.field_text(field))
            .collect();

        let mut run_start = 0;
        let mut new_boundaries = Vec::new();
        for i in 1..=rows.len() {
            let continues = i < rows.len()
                && !boundaries.contains(&i)
                && values.get(i) == values.get(run_start);
            if continues {
                continue;
            }
            if let Some(head) = rows.get_mut(run_start) {
                if let Some(span) = head.row_spans.get_mut(col) {
                    *span = i - run_start;
                }
            }
            for member in rows.iter_mut().take(i).skip(run_start + 1) {
                if let Some(span) = member.row_spans.get_mut(col) {
                    *span = 0;
                }
            }
            new_boundaries.push(i);
            run_start = i;
        }
        boundaries.extend(new_boundaries);
    }
}
