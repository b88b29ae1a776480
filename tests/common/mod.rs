//! In-memory backend for engine tests
//!
//! `MockGateway` keeps one table of JSON rows per resource and answers list
//! requests the way the real API does (filter, search, sort, page). Every
//! call is recorded and suspends once before answering, so tests can
//! interleave other work with an outstanding request.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use masterdesk::core::audit::ActivityPayload;
use masterdesk::core::record::value_text;
use masterdesk::core::{
    ApiGateway, AuditLogger, DynamicRecord, Envelope, FormWorkflowController, GatewayError,
    ListPage, ListQuery, PageMeta, PagedCollectionStore, PermissionGate, PermissionPayload,
    RecordId, ResourceScreen,
};
use masterdesk::resources::{Catalog, ResourceDescriptor};

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { resource: String, query: ListQuery },
    Create { resource: String, body: Value },
    Update { resource: String, id: RecordId, body: Value },
    Delete { resource: String, id: RecordId },
    Permissions { route: String },
    Activity,
}

pub struct MockGateway {
    tables: RefCell<BTreeMap<String, Vec<Value>>>,
    next_id: Cell<i64>,
    permissions: RefCell<Option<PermissionPayload>>,
    reject_mutations: RefCell<Option<String>>,
    fail_activity: Cell<bool>,
    activity: RefCell<Vec<ActivityPayload>>,
    calls: RefCell<Vec<Call>>,
}

impl MockGateway {
    /// Empty backend granting every permission
    pub fn new() -> Self {
        Self {
            tables: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1000),
            permissions: RefCell::new(Some(PermissionPayload {
                is_create: true,
                is_update: true,
                is_delete: true,
                is_view: Some(true),
            })),
            reject_mutations: RefCell::new(None),
            fail_activity: Cell::new(false),
            activity: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_rows(self, resource: &str, rows: Vec<Value>) -> Self {
        self.tables.borrow_mut().insert(resource.to_string(), rows);
        self
    }

    /// `count` rows with codes `U001`, `U002`, ...
    pub fn with_numbered_rows(self, resource: &str, count: usize) -> Self {
        let rows = (1..=count)
            .map(|n| json!({"id": n, "code": format!("U{:03}", n), "name": format!("Unit {}", n)}))
            .collect();
        self.with_rows(resource, rows)
    }

    /// Permission record to return; None answers "no record"
    pub fn with_permissions(self, payload: Option<PermissionPayload>) -> Self {
        self.permissions.replace(payload);
        self
    }

    /// Every create/update/delete is refused with this message
    pub fn reject_mutations(&self, message: &str) {
        self.reject_mutations.replace(Some(message.to_string()));
    }

    pub fn fail_activity_log(&self) {
        self.fail_activity.set(true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn list_calls(&self, resource: &str) -> Vec<ListQuery> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::List { resource: r, query } if r == resource => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| predicate(c)).count()
    }

    pub fn activity(&self) -> Vec<ActivityPayload> {
        self.activity.borrow().clone()
    }

    pub fn rows(&self, resource: &str) -> Vec<Value> {
        self.tables
            .borrow()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn matches(row: &Value, query: &ListQuery) -> bool {
        for (key, expected) in &query.filters {
            let actual = row.get(key).and_then(value_text);
            if actual.as_deref() != Some(expected.as_str()) {
                return false;
            }
        }
        match &query.search {
            Some(search) => {
                let needle = search.to_lowercase();
                row.as_object()
                    .map(|fields| {
                        fields
                            .values()
                            .filter_map(value_text)
                            .any(|text| text.to_lowercase().contains(&needle))
                    })
                    .unwrap_or(false)
            }
            None => true,
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl ApiGateway for MockGateway {
    async fn list(
        &self,
        resource: &str,
        query: &ListQuery,
    ) -> Result<Envelope<ListPage<Value>>, GatewayError> {
        self.record(Call::List {
            resource: resource.to_string(),
            query: query.clone(),
        });
        tokio::task::yield_now().await;

        let mut rows: Vec<Value> = self
            .rows(resource)
            .into_iter()
            .filter(|row| Self::matches(row, query))
            .collect();
        if let Some(sort_by) = &query.sort_by {
            rows.sort_by_key(|row| row.get(sort_by).and_then(value_text).unwrap_or_default());
            if !query.sort_direction.is_ascending() {
                rows.reverse();
            }
        }

        let total_rows = rows.len() as u64;
        let per_page = query.rows.max(1) as usize;
        let total_pages = rows.len().div_ceil(per_page) as u32;
        let start = (query.page.max(1) as usize - 1) * per_page;
        let items: Vec<Value> = rows.into_iter().skip(start).take(per_page).collect();
        let (from, to) = if items.is_empty() {
            (0, 0)
        } else {
            (start as u64 + 1, (start + items.len()) as u64)
        };

        Ok(Envelope::ok(ListPage {
            items,
            pagination: PageMeta {
                page: query.page,
                rows_per_page: query.rows,
                total_rows,
                total_pages,
                from,
                to,
            },
        }))
    }

    async fn create(&self, resource: &str, body: &Value) -> Result<Envelope<Value>, GatewayError> {
        self.record(Call::Create {
            resource: resource.to_string(),
            body: body.clone(),
        });
        tokio::task::yield_now().await;
        if let Some(message) = self.reject_mutations.borrow().clone() {
            return Ok(Envelope::failed(&message));
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let mut row = body.as_object().cloned().unwrap_or_else(Map::new);
        row.insert("id".to_string(), json!(id));
        let row = Value::Object(row);
        self.tables
            .borrow_mut()
            .entry(resource.to_string())
            .or_default()
            .push(row.clone());
        Ok(Envelope::ok(row))
    }

    async fn update(
        &self,
        resource: &str,
        id: &RecordId,
        body: &Value,
    ) -> Result<Envelope<Value>, GatewayError> {
        self.record(Call::Update {
            resource: resource.to_string(),
            id: id.clone(),
            body: body.clone(),
        });
        tokio::task::yield_now().await;
        if let Some(message) = self.reject_mutations.borrow().clone() {
            return Ok(Envelope::failed(&message));
        }

        let mut tables = self.tables.borrow_mut();
        let row = tables.get_mut(resource).and_then(|rows| {
            rows.iter_mut()
                .find(|row| row.get("id").and_then(RecordId::from_json).as_ref() == Some(id))
        });
        match (row, body.as_object()) {
            (Some(Value::Object(fields)), Some(changes)) => {
                for (key, value) in changes {
                    fields.insert(key.clone(), value.clone());
                }
                Ok(Envelope::ok(Value::Object(fields.clone())))
            }
            _ => Err(GatewayError::Status {
                code: 404,
                message: Some("Data not found".to_string()),
            }),
        }
    }

    async fn delete(&self, resource: &str, id: &RecordId) -> Result<Envelope<Value>, GatewayError> {
        self.record(Call::Delete {
            resource: resource.to_string(),
            id: id.clone(),
        });
        tokio::task::yield_now().await;
        if let Some(message) = self.reject_mutations.borrow().clone() {
            return Ok(Envelope::failed(&message));
        }

        let mut tables = self.tables.borrow_mut();
        if let Some(rows) = tables.get_mut(resource) {
            rows.retain(|row| row.get("id").and_then(RecordId::from_json).as_ref() != Some(id));
        }
        Ok(Envelope::ok(Value::Null))
    }

    async fn permissions(&self, route: &str) -> Result<Envelope<PermissionPayload>, GatewayError> {
        self.record(Call::Permissions {
            route: route.to_string(),
        });
        tokio::task::yield_now().await;
        Ok(match self.permissions.borrow().clone() {
            Some(payload) => Envelope::ok(payload),
            None => Envelope::failed("Permission not found"),
        })
    }

    async fn record_activity(&self, entry: &ActivityPayload) -> Result<(), GatewayError> {
        self.record(Call::Activity);
        tokio::task::yield_now().await;
        if self.fail_activity.get() {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        self.activity.borrow_mut().push(entry.clone());
        Ok(())
    }
}

/// Descriptor from the built-in catalog
pub fn descriptor(key: &str) -> ResourceDescriptor {
    Catalog::builtin()
        .expect("builtin catalog parses")
        .get(key)
        .expect("resource exists")
        .clone()
}

/// Screen for a built-in resource, wired like the CLI wires it
pub fn screen(gateway: &Rc<MockGateway>, key: &str) -> ResourceScreen<DynamicRecord> {
    let descriptor = descriptor(key);
    let gw: Rc<dyn ApiGateway> = gateway.clone();
    let store = Rc::new(
        PagedCollectionStore::new(Rc::clone(&gw), &descriptor.path)
            .with_id_field(&descriptor.id_field)
            .with_filters(descriptor.filter_state()),
    );
    let audit = AuditLogger::new(Rc::clone(&gw), "jsmith").with_origin("linux");
    let controller = FormWorkflowController::new(
        Rc::clone(&gw),
        Rc::clone(&store),
        Rc::new(descriptor.schema()),
        audit,
        &descriptor.label,
    );
    let gate = Rc::new(PermissionGate::new(Rc::clone(&gw)));

    let mut screen = ResourceScreen::new(descriptor.scope(), gate, store, controller);
    for spec in &descriptor.pickers {
        let foreign = self::descriptor(&spec.resource);
        let mut picker = masterdesk::core::DependentPickerCache::new(
            Rc::clone(&gw),
            &foreign.path,
            &spec.label_field,
        )
        .with_id_field(&foreign.id_field)
        .with_rows(2);
        if let Some(parent) = &spec.parent {
            picker = picker.with_parent(parent);
        }
        screen = screen.with_picker(&spec.field, picker);
    }
    screen
}
