//! Search text and structural filters that parameterize a list fetch

use std::collections::BTreeMap;

/// Free-text search plus keyed filter values, with parent → child cascades
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    search: String,
    values: BTreeMap<String, String>,
    /// (parent, child) pairs; changing a parent clears its children
    cascades: Vec<(String, String)>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `child` depends on `parent`
    pub fn cascade(mut self, parent: &str, child: &str) -> Self {
        self.cascades.push((parent.to_string(), child.to_string()));
        self
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns true when the search text actually changed
    pub fn set_search(&mut self, text: &str) -> bool {
        let text = text.trim();
        if self.search == text {
            return false;
        }
        self.search = text.to_string();
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set (or with an empty value, clear) a filter
    ///
    /// When the value changes, every filter downstream of `key` is cleared as
    /// well. Returns the keys of the cleared dependents, nearest first, or
    /// None when the value did not change.
    pub fn set(&mut self, key: &str, value: &str) -> Option<Vec<String>> {
        let value = value.trim();
        let current = self.values.get(key).map(String::as_str).unwrap_or("");
        if current == value {
            return None;
        }

        if value.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }

        let cleared = self.dependents_of(key);
        for child in &cleared {
            self.values.remove(child);
        }
        Some(cleared)
    }

    /// All transitive dependents of `key`, breadth first
    pub fn dependents_of(&self, key: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut frontier = vec![key.to_string()];
        while let Some(parent) = frontier.pop() {
            for (p, child) in &self.cascades {
                if *p == parent && child != key && !found.contains(child) {
                    found.push(child.clone());
                    frontier.insert(0, child.clone());
                }
            }
        }
        found
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Clear search and all filters
    pub fn reset(&mut self) {
        self.search.clear();
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location_filters() -> FilterState {
        FilterState::new()
            .cascade("building_id", "section_id")
            .cascade("section_id", "room_id")
    }

    #[test]
    fn test_set_search_trims_and_detects_change() {
        let mut f = FilterState::new();
        assert!(f.set_search("  north "));
        assert_eq!(f.search(), "north");
        assert!(!f.set_search("north"));
    }

    #[test]
    fn test_parent_change_clears_dependents_transitively() {
        let mut f = location_filters();
        f.set("building_id", "1");
        f.set("section_id", "10");
        f.set("room_id", "100");

        let cleared = f.set("building_id", "2").unwrap();
        assert_eq!(cleared, vec!["section_id".to_string(), "room_id".to_string()]);
        assert_eq!(f.get("building_id"), Some("2"));
        assert_eq!(f.get("section_id"), None);
        assert_eq!(f.get("room_id"), None);
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut f = location_filters();
        f.set("building_id", "1");
        f.set("section_id", "10");
        assert!(f.set("building_id", "1").is_none());
        assert_eq!(f.get("section_id"), Some("10"));
    }

    #[test]
    fn test_empty_value_clears_filter() {
        let mut f = location_filters();
        f.set("building_id", "1");
        f.set("building_id", "");
        assert!(f.values().is_empty());
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let f = FilterState::new().cascade("a", "b").cascade("b", "a");
        assert_eq!(f.dependents_of("a"), vec!["b".to_string()]);
    }
}
