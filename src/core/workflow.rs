//! Form workflow controller: selection, modal mode, validation and the
//! mutation lifecycle of one resource table
//!
//! A submission always runs the same fixed sequence:
//!
//! 1. mutation call (create / update / delete)
//! 2. one audit entry, success or failure
//! 3. modal closes (back to `Idle`)
//! 4. on success only: selection cleared (edit/delete) and table refreshed

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{info, warn};

use crate::core::audit::{describe_change, describe_single, AuditAction, AuditEntry, AuditLogger};
use crate::core::form::{FieldErrors, FieldValue, FieldValues, FormMode, FormSchema, FormState};
use crate::core::gateway::ApiGateway;
use crate::core::record::{Record, RecordId};
use crate::core::store::PagedCollectionStore;

/// Precondition notice raised when an action needs a selected row
pub const SELECT_FIRST: &str = "Please select a record first";

/// Fallback when a failed mutation carries no server message
pub const ACTION_FAILED: &str = "Action failed, please check your data";

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient notification for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Result of `submit()`
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing to submit (modal idle or read-only) or a submission is running
    Ignored,
    /// Local validation failed; the modal stays open with these errors
    Invalid(FieldErrors),
    /// The server answered; the modal is closed either way
    Completed {
        success: bool,
        message: String,
        audit: AuditEntry,
    },
}

enum Mutation {
    Create(serde_json::Value),
    Update(RecordId, serde_json::Value),
    Delete(RecordId),
}

pub struct FormWorkflowController<T> {
    entity_label: String,
    schema: Rc<FormSchema>,
    store: Rc<PagedCollectionStore<T>>,
    gateway: Rc<dyn ApiGateway>,
    audit: AuditLogger,
    form: RefCell<FormState>,
    selection: RefCell<Option<T>>,
    submitting: Cell<bool>,
    notices: RefCell<Vec<Notice>>,
}

impl<T: Record> FormWorkflowController<T> {
    pub fn new(
        gateway: Rc<dyn ApiGateway>,
        store: Rc<PagedCollectionStore<T>>,
        schema: Rc<FormSchema>,
        audit: AuditLogger,
        entity_label: &str,
    ) -> Self {
        Self {
            entity_label: entity_label.to_string(),
            schema,
            store,
            gateway,
            audit,
            form: RefCell::new(FormState::default()),
            selection: RefCell::new(None),
            submitting: Cell::new(false),
            notices: RefCell::new(Vec::new()),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn form(&self) -> FormState {
        self.form.borrow().clone()
    }

    pub fn mode(&self) -> FormMode {
        self.form.borrow().mode
    }

    // ========== Selection ==========

    pub fn selection(&self) -> Option<T> {
        self.selection.borrow().clone()
    }

    /// Row click
    pub fn select(&self, record: T) {
        self.selection.replace(Some(record));
    }

    /// Select a row of the currently loaded page
    pub fn select_id(&self, id: &RecordId) -> bool {
        match self.store.find(id) {
            Some(record) => {
                self.select(record);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&self) {
        self.selection.replace(None);
    }

    // ========== Modal transitions ==========

    /// Idle → Add with a blank form
    pub fn open_add(&self) -> bool {
        if self.mode().is_open() {
            return false;
        }
        let mut form = self.form.borrow_mut();
        form.reset();
        form.mode = FormMode::Add;
        form.title = format!("Add {}", self.entity_label);
        form.values = self.schema.blank_values();
        true
    }

    /// Idle → Edit, pre-filled from the selection
    pub fn open_edit(&self) -> bool {
        self.open_with_selection(FormMode::Edit, "Edit")
    }

    /// Idle → Delete confirmation for the selection
    pub fn open_delete(&self) -> bool {
        self.open_with_selection(FormMode::Delete, "Delete")
    }

    /// Idle → read-only View of the selection
    pub fn open_view(&self) -> bool {
        self.open_with_selection(FormMode::View, "View")
    }

    fn open_with_selection(&self, mode: FormMode, verb: &str) -> bool {
        if self.mode().is_open() {
            return false;
        }
        let Some(values) = self
            .selection
            .borrow()
            .as_ref()
            .map(|record| record.field_values(&self.schema))
        else {
            self.notify(NoticeLevel::Warning, SELECT_FIRST);
            return false;
        };

        let mut form = self.form.borrow_mut();
        form.reset();
        form.mode = mode;
        form.title = format!("{} {}", verb, self.entity_label);
        form.values = values;
        true
    }

    /// Close the modal without submitting; the selection is kept
    ///
    /// Ignored while a submission is running: that submission closes the
    /// modal itself once it completes.
    pub fn cancel(&self) {
        if self.submitting.get() {
            return;
        }
        self.form.borrow_mut().reset();
    }

    // ========== Field input ==========

    /// Set a typed value; refused outside Add/Edit or for unknown fields
    pub fn set_field(&self, name: &str, value: FieldValue) -> bool {
        let mut form = self.form.borrow_mut();
        if !form.is_editable() || self.schema.find(name).is_none() {
            return false;
        }
        form.values.set(name, value);
        form.errors.remove(name);
        form.rejected.remove(name);
        true
    }

    /// Set a value from raw text, parsed according to the field kind
    ///
    /// A parse failure is recorded as that field's error.
    pub fn set_field_input(&self, name: &str, input: &str) -> Result<(), String> {
        let Some(field) = self.schema.find(name) else {
            return Err(format!("Unknown field: {}", name));
        };
        if !self.mode().is_editable() {
            return Err("The form is not editable".to_string());
        }
        match FieldValue::parse(&field.kind, input) {
            Ok(value) => {
                self.set_field(name, value);
                Ok(())
            }
            Err(e) => {
                let mut form = self.form.borrow_mut();
                form.errors.insert(name.to_string(), e.clone());
                form.rejected.insert(name.to_string(), e.clone());
                Err(e)
            }
        }
    }

    // ========== Submission ==========

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    /// Whether the confirm control is enabled
    pub fn can_submit(&self) -> bool {
        !self.submitting.get()
            && matches!(self.mode(), FormMode::Add | FormMode::Edit | FormMode::Delete)
    }

    /// Run the mutation for the open modal
    pub async fn submit(&self) -> SubmitOutcome {
        if !self.can_submit() {
            return SubmitOutcome::Ignored;
        }
        let mode = self.mode();
        let values = self.form.borrow().values.clone();
        let selection = self.selection();

        if mode.is_editable() {
            let mut errors = self.schema.validate(&values);
            errors.extend(self.form.borrow().rejected.clone());
            if !errors.is_empty() {
                self.form.borrow_mut().errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        }

        let (action, mutation) = match (mode, &selection) {
            (FormMode::Add, _) => (AuditAction::Create, Mutation::Create(self.schema.payload(&values))),
            (FormMode::Edit, Some(record)) => (
                AuditAction::Update,
                Mutation::Update(record.id().clone(), self.schema.payload(&values)),
            ),
            (FormMode::Delete, Some(record)) => {
                (AuditAction::Delete, Mutation::Delete(record.id().clone()))
            }
            _ => {
                // Selection vanished while the modal was open
                self.notify(NoticeLevel::Warning, SELECT_FIRST);
                self.cancel();
                return SubmitOutcome::Ignored;
            }
        };

        self.submitting.set(true);
        let resource = self.store.resource().to_string();
        let result = match &mutation {
            Mutation::Create(body) => self.gateway.create(&resource, body).await,
            Mutation::Update(id, body) => self.gateway.update(&resource, id, body).await,
            Mutation::Delete(id) => self.gateway.delete(&resource, id).await,
        };

        let (success, server_message) = match result {
            Ok(env) => (env.status, env.message().map(str::to_string)),
            Err(e) => {
                warn!(%resource, %action, error = %e, "mutation request failed");
                (false, e.server_message().map(str::to_string))
            }
        };
        let message = server_message.unwrap_or_else(|| {
            if success {
                default_success_message(action).to_string()
            } else {
                ACTION_FAILED.to_string()
            }
        });

        let new_code = values.text(&self.schema.code_field).unwrap_or_default();
        let old_code = selection
            .as_ref()
            .map(|record| self.code_of(&record.field_values(&self.schema), record.id()))
            .unwrap_or_default();
        let audit_message = match action {
            AuditAction::Create => describe_single(&message, &new_code),
            AuditAction::Update => describe_change(&message, &old_code, &new_code),
            AuditAction::Delete => describe_single(&message, &old_code),
        };
        let audit = self.audit.record(action, success, audit_message).await;

        self.form.borrow_mut().reset();
        self.submitting.set(false);
        info!(%resource, %action, success, "mutation completed");

        if success {
            self.notify(NoticeLevel::Success, &message);
            if action != AuditAction::Create {
                self.clear_selection();
            }
            self.store.refresh().await;
        } else {
            self.notify(NoticeLevel::Error, &message);
        }

        SubmitOutcome::Completed {
            success,
            message,
            audit,
        }
    }

    fn code_of(&self, values: &FieldValues, id: &RecordId) -> String {
        values
            .text(&self.schema.code_field)
            .unwrap_or_else(|| id.to_string())
    }

    // ========== Notices ==========

    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.borrow_mut().push(Notice {
            level,
            message: message.to_string(),
        });
    }

    /// Pending notices, oldest first (without draining them)
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Drain pending notices for display
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }
}

fn default_success_message(action: AuditAction) -> &'static str {
    match action {
        AuditAction::Create => "Data saved successfully",
        AuditAction::Update => "Data updated successfully",
        AuditAction::Delete => "Data deleted successfully",
    }
}
