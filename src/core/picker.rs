//! Incrementally loaded option lists for reference fields
//!
//! A picker searches a foreign resource page by page. Options are kept per
//! distinct search string; scrolling near the bottom of the rendered list
//! pulls the next page. Pickers that depend on a parent value are wiped when
//! that value changes so they never offer options of the wrong parent.

use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::core::gateway::{ApiGateway, ListQuery};
use crate::core::record::{value_text, RecordId};

/// Default number of options per page
pub const DEFAULT_PICKER_ROWS: u32 = 20;

/// A lightweight projection of a foreign record used for selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependentOption {
    pub id: RecordId,
    pub label: String,
    pub metadata: Map<String, Value>,
}

impl DependentOption {
    /// Project a list row; rows without an id are skipped
    pub fn from_row(row: Value, id_field: &str, label_field: &str) -> Option<Self> {
        let Value::Object(metadata) = row else {
            return None;
        };
        let id = metadata.get(id_field).and_then(RecordId::from_json)?;
        let label = metadata
            .get(label_field)
            .and_then(value_text)
            .unwrap_or_else(|| id.to_string());
        Some(Self { id, label, metadata })
    }
}

/// Result of a picker fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    /// First page for a search string replaced the list
    Replaced(usize),
    /// A further page was appended
    Appended(usize),
    /// Nothing requested: already loading, nothing more, or parent missing
    Skipped,
    Failed(String),
    /// Response dropped after a reset, new search, or unmount
    Stale,
}

/// When scrolling should trigger `load_more`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    /// Rendered height of one option
    pub item_extent: f64,
    /// How many options before the end loading starts
    pub lookahead: usize,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self {
            item_extent: 36.0,
            lookahead: 5,
        }
    }
}

impl ScrollTrigger {
    /// Scroll offset past which the next page is requested
    pub fn threshold(&self, loaded: usize) -> f64 {
        loaded.saturating_sub(self.lookahead) as f64 * self.item_extent
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    options: Vec<DependentOption>,
    next_page: u32,
    has_more: bool,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            next_page: 1,
            has_more: true,
        }
    }
}

pub struct DependentPickerCache {
    resource: String,
    id_field: String,
    label_field: String,
    rows: u32,
    trigger: ScrollTrigger,
    gateway: Rc<dyn ApiGateway>,
    parent_key: Option<String>,
    parent_value: RefCell<Option<String>>,
    search: RefCell<String>,
    entries: RefCell<HashMap<String, CacheEntry>>,
    selected: RefCell<Option<DependentOption>>,
    /// Ticket of the outstanding request, if any
    in_flight: Cell<Option<u64>>,
    generation: Cell<u64>,
    mounted: Cell<bool>,
}

impl DependentPickerCache {
    pub fn new(gateway: Rc<dyn ApiGateway>, resource: &str, label_field: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id_field: "id".to_string(),
            label_field: label_field.to_string(),
            rows: DEFAULT_PICKER_ROWS,
            trigger: ScrollTrigger::default(),
            gateway,
            parent_key: None,
            parent_value: RefCell::new(None),
            search: RefCell::new(String::new()),
            entries: RefCell::new(HashMap::new()),
            selected: RefCell::new(None),
            in_flight: Cell::new(None),
            generation: Cell::new(0),
            mounted: Cell::new(true),
        }
    }

    pub fn with_id_field(mut self, id_field: &str) -> Self {
        self.id_field = id_field.to_string();
        self
    }

    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = rows.max(1);
        self
    }

    pub fn with_trigger(mut self, trigger: ScrollTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Options are filtered by `key = <parent value>`; nothing loads until
    /// a parent value is set
    pub fn with_parent(mut self, key: &str) -> Self {
        self.parent_key = Some(key.to_string());
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.parent_key.as_deref()
    }

    pub fn parent_value(&self) -> Option<String> {
        self.parent_value.borrow().clone()
    }

    pub fn search_text(&self) -> String {
        self.search.borrow().clone()
    }

    /// Options loaded for the current search string
    pub fn options(&self) -> Vec<DependentOption> {
        let key = self.search.borrow();
        self.entries
            .borrow()
            .get(key.as_str())
            .map(|e| e.options.clone())
            .unwrap_or_default()
    }

    pub fn has_more(&self) -> bool {
        let key = self.search.borrow();
        self.entries
            .borrow()
            .get(key.as_str())
            .map(|e| e.has_more)
            .unwrap_or(true)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.get().is_some()
    }

    pub fn selected(&self) -> Option<DependentOption> {
        self.selected.borrow().clone()
    }

    /// Select one of the loaded options by id
    pub fn select(&self, id: &RecordId) -> bool {
        let option = self.options().into_iter().find(|o| &o.id == id);
        match option {
            Some(option) => {
                self.selected.replace(Some(option));
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&self) {
        self.selected.replace(None);
    }

    /// Start over with `text`: cursor back to page 1, list replaced by the
    /// first matching page. Supersedes any request still in flight.
    pub async fn search(&self, text: &str) -> PickerOutcome {
        let text = text.trim().to_string();
        self.search.replace(text.clone());
        self.entries.borrow_mut().insert(text.clone(), CacheEntry::default());
        self.abandon_in_flight();
        self.fetch_page(text, 1).await
    }

    /// Append the next page unless one is already loading or none is left
    pub async fn load_more(&self) -> PickerOutcome {
        if self.in_flight.get().is_some() || !self.has_more() {
            return PickerOutcome::Skipped;
        }
        let text = self.search_text();
        let next_page = self
            .entries
            .borrow()
            .get(&text)
            .map(|e| e.next_page)
            .unwrap_or(1);
        self.fetch_page(text, next_page).await
    }

    /// Scroll notification from the option list; loads more once the offset
    /// passes the threshold for the number of loaded options
    pub async fn on_scroll(&self, offset: f64) -> PickerOutcome {
        let loaded = self.options().len();
        if offset < self.trigger.threshold(loaded) {
            return PickerOutcome::Skipped;
        }
        self.load_more().await
    }

    /// Upstream value changed: drop options, search text and selection
    ///
    /// Returns false when the value is unchanged and nothing was reset.
    pub fn set_parent(&self, value: Option<&str>) -> bool {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        if self.parent_value.borrow().as_deref() == value {
            return false;
        }
        self.parent_value.replace(value.map(str::to_string));
        self.reset();
        true
    }

    /// Clear all cached options, search text and selection
    pub fn reset(&self) {
        self.entries.borrow_mut().clear();
        self.search.borrow_mut().clear();
        self.selected.replace(None);
        self.abandon_in_flight();
    }

    /// Drop late responses from now on
    pub fn unmount(&self) {
        self.mounted.set(false);
        self.abandon_in_flight();
    }

    fn abandon_in_flight(&self) {
        self.generation.set(self.generation.get() + 1);
        self.in_flight.set(None);
    }

    fn query(&self, text: &str, page: u32) -> Option<ListQuery> {
        let mut filters = BTreeMap::new();
        if let Some(key) = &self.parent_key {
            let value = self.parent_value.borrow().clone()?;
            filters.insert(key.clone(), value);
        }
        Some(ListQuery {
            page,
            rows: self.rows,
            search: Some(text.to_string()).filter(|s| !s.is_empty()),
            filters,
            ..ListQuery::default()
        })
    }

    async fn fetch_page(&self, text: String, page: u32) -> PickerOutcome {
        if !self.mounted.get() {
            return PickerOutcome::Stale;
        }
        let Some(query) = self.query(&text, page) else {
            debug!(resource = %self.resource, "picker waits for a parent value");
            return PickerOutcome::Skipped;
        };

        let ticket = self.generation.get() + 1;
        self.generation.set(ticket);
        self.in_flight.set(Some(ticket));
        debug!(resource = %self.resource, page, search = %text, "loading options");

        let result = self.gateway.list(&self.resource, &query).await;

        if self.generation.get() != ticket || !self.mounted.get() {
            return PickerOutcome::Stale;
        }
        self.in_flight.set(None);

        let data = match result {
            Ok(env) if env.status => env.data,
            Ok(env) => {
                let message = env.message().unwrap_or("Failed to load options").to_string();
                warn!(resource = %self.resource, %message, "option fetch rejected");
                return PickerOutcome::Failed(message);
            }
            Err(e) => {
                warn!(resource = %self.resource, error = %e, "option fetch failed");
                return PickerOutcome::Failed(e.to_string());
            }
        };

        let (rows, meta) = match data {
            Some(page) => (page.items, page.pagination),
            None => (Vec::new(), Default::default()),
        };
        let received = rows.len();
        let options: Vec<DependentOption> = rows
            .into_iter()
            .filter_map(|row| DependentOption::from_row(row, &self.id_field, &self.label_field))
            .collect();
        let has_more = if meta.total_pages > 0 {
            page < meta.total_pages
        } else {
            received as u32 >= self.rows
        };

        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(text).or_default();
        let count = options.len();
        if page == 1 {
            entry.options = options;
        } else {
            entry.options.extend(options);
        }
        entry.next_page = page + 1;
        entry.has_more = has_more;

        if page == 1 {
            PickerOutcome::Replaced(count)
        } else {
            PickerOutcome::Appended(count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_projection() {
        let option =
            DependentOption::from_row(json!({"id": 4, "name": "North wing"}), "id", "name").unwrap();
        assert_eq!(option.id, RecordId::new("4"));
        assert_eq!(option.label, "North wing");
        assert_eq!(option.metadata.get("name"), Some(&json!("North wing")));

        let no_label = DependentOption::from_row(json!({"id": "b-9"}), "id", "name").unwrap();
        assert_eq!(no_label.label, "b-9");

        assert!(DependentOption::from_row(json!({"name": "x"}), "id", "name").is_none());
    }

    #[test]
    fn test_scroll_threshold_follows_loaded_count() {
        let trigger = ScrollTrigger {
            item_extent: 10.0,
            lookahead: 5,
        };
        assert_eq!(trigger.threshold(20), 150.0);
        assert_eq!(trigger.threshold(40), 350.0);
        assert_eq!(trigger.threshold(3), 0.0);
    }
}
