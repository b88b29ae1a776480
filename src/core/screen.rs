//! One administration screen: a table, its filters and pickers, the form
//! workflow and the permission gate wired together

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

use crate::core::form::FieldValue;
use crate::core::pagination::RowsPerPage;
use crate::core::permission::{Action, PermissionGate, PermissionScope, PermissionSet};
use crate::core::picker::DependentPickerCache;
use crate::core::record::{Record, RecordId};
use crate::core::store::{FetchOutcome, PagedCollectionStore};
use crate::core::workflow::{FormWorkflowController, SubmitOutcome};

pub struct ResourceScreen<T> {
    scope: PermissionScope,
    gate: Rc<PermissionGate>,
    store: Rc<PagedCollectionStore<T>>,
    controller: FormWorkflowController<T>,
    /// Pickers keyed by the field or filter they fill
    pickers: BTreeMap<String, DependentPickerCache>,
    permissions: Cell<Option<PermissionSet>>,
}

impl<T: Record> ResourceScreen<T> {
    pub fn new(
        scope: PermissionScope,
        gate: Rc<PermissionGate>,
        store: Rc<PagedCollectionStore<T>>,
        controller: FormWorkflowController<T>,
    ) -> Self {
        Self {
            scope,
            gate,
            store,
            controller,
            pickers: BTreeMap::new(),
            permissions: Cell::new(None),
        }
    }

    pub fn with_picker(mut self, field: &str, picker: DependentPickerCache) -> Self {
        self.pickers.insert(field.to_string(), picker);
        self
    }

    pub fn scope(&self) -> &PermissionScope {
        &self.scope
    }

    pub fn store(&self) -> &PagedCollectionStore<T> {
        &self.store
    }

    pub fn controller(&self) -> &FormWorkflowController<T> {
        &self.controller
    }

    pub fn picker(&self, field: &str) -> Option<&DependentPickerCache> {
        self.pickers.get(field)
    }

    /// Resolved permissions; view-only until `mount()` resolved them
    pub fn permissions(&self) -> PermissionSet {
        self.permissions.get().unwrap_or_default()
    }

    pub fn visible_actions(&self) -> Vec<Action> {
        self.permissions().visible_actions()
    }

    /// Resolve permissions, then load the first page
    pub async fn mount(&self) -> FetchOutcome {
        let permissions = self.gate.resolve(&self.scope).await;
        self.permissions.set(Some(permissions));
        debug!(resource = %self.scope.resource, actions = ?permissions.visible_actions(), "screen mounted");
        self.store.fetch().await
    }

    /// Abandon everything still in flight
    pub fn unmount(&self) {
        self.store.unmount();
        for picker in self.pickers.values() {
            picker.unmount();
        }
    }

    // ========== Table parameters ==========

    pub async fn search(&self, text: &str) -> FetchOutcome {
        self.store.set_search(text);
        self.store.fetch().await
    }

    /// Change a structural filter and reload
    ///
    /// Downstream filters are cleared and pickers hanging off the changed
    /// filters are reset. Returns None when the value did not change.
    pub async fn set_filter(&self, key: &str, value: &str) -> Option<FetchOutcome> {
        let cleared = self.store.set_filter(key, value)?;
        let filters = self.store.filters();

        for picker in self.pickers.values() {
            match picker.parent_key() {
                Some(parent) if parent == key => {
                    picker.set_parent(filters.get(key));
                }
                Some(parent) if cleared.iter().any(|c| c == parent) => {
                    picker.set_parent(None);
                }
                _ => {}
            }
        }
        for child in &cleared {
            if let Some(picker) = self.pickers.get(child) {
                picker.clear_selection();
            }
        }

        Some(self.store.fetch().await)
    }

    pub async fn sort_by(&self, key: &str) -> FetchOutcome {
        self.store.set_sort(key);
        self.store.fetch().await
    }

    pub async fn go_to_page(&self, page: u32) -> FetchOutcome {
        self.store.set_page(page);
        self.store.fetch().await
    }

    pub async fn change_rows_per_page(&self, rows: RowsPerPage) -> FetchOutcome {
        self.store.set_rows_per_page(rows);
        self.store.fetch().await
    }

    // ========== Workflow ==========

    pub fn select_row(&self, id: &RecordId) -> bool {
        self.controller.select_id(id)
    }

    /// Open the modal for `action`; hidden actions are refused silently
    pub fn begin(&self, action: Action) -> bool {
        if !self.permissions().allows(action) {
            debug!(resource = %self.scope.resource, %action, "action not permitted");
            return false;
        }
        match action {
            Action::Create => self.controller.open_add(),
            Action::Update => self.controller.open_edit(),
            Action::Delete => self.controller.open_delete(),
            Action::View => self.controller.open_view(),
        }
    }

    /// Form input; pickers depending on `name` follow the new value
    pub fn set_field(&self, name: &str, value: FieldValue) -> bool {
        if !self.controller.set_field(name, value) {
            return false;
        }
        self.cascade_field(name);
        true
    }

    /// Raw text input, parsed by field kind; same cascade as `set_field`
    pub fn set_field_input(&self, name: &str, input: &str) -> Result<(), String> {
        self.controller.set_field_input(name, input)?;
        self.cascade_field(name);
        Ok(())
    }

    fn cascade_field(&self, name: &str) {
        let value = self.controller.form().values.text(name);
        for picker in self.pickers.values() {
            if picker.parent_key() == Some(name) {
                picker.set_parent(value.as_deref());
            }
        }
    }

    pub async fn submit(&self) -> SubmitOutcome {
        self.controller.submit().await
    }
}
