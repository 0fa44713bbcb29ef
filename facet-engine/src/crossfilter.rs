//! Cross-filter registry.
//!
//! A shared registry of at most one [`CrossFilter`] per source widget,
//! scoped to one dashboard viewing session. Sibling widgets consume every
//! filter except their own; a `watch` channel carries a version bump on
//! every change so consumers can await updates instead of polling.

use facet_core::{CrossFilter, WidgetId};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;

/// Shared cross-filter registry for one dashboard session.
pub struct CrossFilterBus {
    filters: Mutex<HashMap<WidgetId, CrossFilter>>,
    version: watch::Sender<u64>,
}

impl Default for CrossFilterBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossFilterBus {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            filters: Mutex::new(HashMap::new()),
            version,
        }
    }

    /// Register a filter, replacing any existing one from the same source.
    pub fn add_filter(&self, filter: CrossFilter) {
        self.filters
            .lock()
            .unwrap()
            .insert(filter.source_widget_id, filter);
        self.bump();
    }

    /// Toggle a selection.
    ///
    /// Re-selecting the identical column/value pair from the same source
    /// removes the filter (deselect); anything else replaces or adds it.
    /// Returns whether a filter from this source is active afterwards.
    pub fn toggle_filter(&self, filter: CrossFilter) -> bool {
        let mut filters = self.filters.lock().unwrap();
        let source = filter.source_widget_id;
        let is_deselect = filters
            .get(&source)
            .is_some_and(|existing| existing.column == filter.column && existing.value == filter.value);

        let active = if is_deselect {
            filters.remove(&source);
            false
        } else {
            filters.insert(source, filter);
            true
        };
        drop(filters);
        self.bump();
        active
    }

    /// Remove the filter from `source`, if any.
    pub fn remove_filter(&self, source: WidgetId) {
        let removed = self.filters.lock().unwrap().remove(&source).is_some();
        if removed {
            self.bump();
        }
    }

    /// Drop every registered filter.
    pub fn clear(&self) {
        let mut filters = self.filters.lock().unwrap();
        if filters.is_empty() {
            return;
        }
        filters.clear();
        drop(filters);
        self.bump();
    }

    /// The active filter registered by `source`, if any.
    pub fn active_filter(&self, source: WidgetId) -> Option<CrossFilter> {
        self.filters.lock().unwrap().get(&source).cloned()
    }

    /// Every filter applicable to `widget_id`: all registered filters except
    /// those it registered itself. A widget never filters itself.
    pub fn applicable_filters(&self, widget_id: WidgetId) -> Vec<CrossFilter> {
        self.filters
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.source_widget_id != widget_id)
            .cloned()
            .collect()
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.lock().unwrap().is_empty()
    }

    /// Subscribe to change notifications. The carried value is a version
    /// counter bumped on every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
