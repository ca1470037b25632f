//! Role-based marker visibility.
//!
//! A marker may carry several roles and stays visible while *any* of
//! them is selected. Rather than re-scanning every marker's role list
//! on each legend toggle, the engine keeps a per-marker reference count
//! of currently-active roles; toggling one role then only touches the
//! markers registered under that role.

use std::collections::{HashMap, HashSet};

/// Stable identifier of a rendered marker, assigned at creation and
/// valid until the map is fully reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub usize);

/// The rendered layer the engine drives. Implementations add/remove
/// the marker from the displayed layer; the engine never manipulates
/// the surface in any other way.
pub trait MarkerLayer {
    fn show_marker(&mut self, marker: MarkerId);
    fn hide_marker(&mut self, marker: MarkerId);
}

/// Role label → markers carrying that role, in insertion order.
///
/// Registration happens exactly once per marker, when it is created;
/// duplicates are therefore impossible by contract.
#[derive(Debug, Default)]
pub struct CategoryIndex {
    by_role: HashMap<String, Vec<MarkerId>>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `marker` under each of its roles, creating role
    /// collections as needed. Call exactly once per marker.
    pub fn register(&mut self, marker: MarkerId, roles: &[String]) {
        for role in roles {
            self.by_role.entry(role.clone()).or_default().push(marker);
        }
    }

    /// Markers carrying `role`; empty for unknown roles.
    pub fn lookup(&self, role: &str) -> &[MarkerId] {
        self.by_role.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.by_role.keys().map(String::as_str)
    }

    /// Drop all role collections (full map reload).
    pub fn reset(&mut self) {
        self.by_role.clear();
    }
}

/// Reference-counted visibility state.
///
/// Until the user first interacts with the legend, filtering is
/// disabled and every marker is shown with a count of 1. The first
/// explicit selection switches to counted mode with a cold-start
/// rebuild; after that, selection changes apply as increment/decrement
/// deltas over the symmetric difference of the role sets.
///
/// Invariant: a marker is visible iff its count is positive, and the
/// count equals the number of its roles currently active (or 1 while
/// filtering is disabled). Counts never go negative.
#[derive(Debug, Default)]
pub struct VisibilityEngine {
    filtering_enabled: bool,
    active: HashSet<String>,
    counts: HashMap<MarkerId, u32>,
}

impl VisibilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filtering_enabled(&self) -> bool {
        self.filtering_enabled
    }

    pub fn active_roles(&self) -> &HashSet<String> {
        &self.active
    }

    pub fn count(&self, marker: MarkerId) -> u32 {
        self.counts.get(&marker).copied().unwrap_or(0)
    }

    pub fn is_visible(&self, marker: MarkerId) -> bool {
        self.count(marker) > 0
    }

    /// Decide a newly created marker's visibility against the current
    /// state. Markers created while a load is in flight see the active
    /// set as it is *now*; they were not part of any earlier delta.
    pub fn set_initial_visibility(
        &mut self,
        layer: &mut dyn MarkerLayer,
        marker: MarkerId,
        roles: &[String],
    ) {
        if !self.filtering_enabled {
            self.counts.insert(marker, 1);
            layer.show_marker(marker);
            return;
        }
        let count = roles.iter().filter(|r| self.active.contains(*r)).count() as u32;
        self.counts.insert(marker, count);
        if count > 0 {
            layer.show_marker(marker);
        } else {
            layer.hide_marker(marker);
        }
    }

    /// Apply a new legend selection.
    ///
    /// Normally only the roles in the symmetric difference are walked;
    /// identical selections are a no-op. The first selection after the
    /// disabled state instead rebuilds from zero, so no counts inherited
    /// from "everything visible" leak into counted mode.
    pub fn apply_selection(
        &mut self,
        index: &CategoryIndex,
        layer: &mut dyn MarkerLayer,
        selection: HashSet<String>,
    ) {
        if !self.filtering_enabled {
            self.filtering_enabled = true;
            self.rebuild(index, layer, &selection);
            self.active = selection;
            return;
        }

        let removed: Vec<String> = self.active.difference(&selection).cloned().collect();
        let added: Vec<String> = selection.difference(&self.active).cloned().collect();
        if removed.is_empty() && added.is_empty() {
            return;
        }

        for role in &removed {
            for &marker in index.lookup(role) {
                self.decrement(layer, marker);
            }
        }
        for role in &added {
            for &marker in index.lookup(role) {
                self.increment(layer, marker);
            }
        }

        self.active = selection;
    }

    /// Back to the pristine "filtering disabled" state (full reload).
    pub fn reset(&mut self) {
        self.filtering_enabled = false;
        self.active.clear();
        self.counts.clear();
    }

    fn increment(&mut self, layer: &mut dyn MarkerLayer, marker: MarkerId) {
        let count = self.counts.entry(marker).or_insert(0);
        *count += 1;
        if *count == 1 {
            layer.show_marker(marker);
        }
    }

    fn decrement(&mut self, layer: &mut dyn MarkerLayer, marker: MarkerId) {
        let Some(count) = self.counts.get_mut(&marker) else {
            return;
        };
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            layer.hide_marker(marker);
        }
    }

    /// Cold start: hide every known marker, zero every count, then
    /// count up from the selection alone.
    fn rebuild(
        &mut self,
        index: &CategoryIndex,
        layer: &mut dyn MarkerLayer,
        selection: &HashSet<String>,
    ) {
        for (&marker, count) in self.counts.iter_mut() {
            *count = 0;
            layer.hide_marker(marker);
        }
        for role in selection {
            for &marker in index.lookup(role) {
                self.increment(layer, marker);
            }
        }
    }
}
