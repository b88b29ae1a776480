//! Shared utilities for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use std::future::Future;
use std::rc::Rc;

use crate::cli::GlobalOpts;
use crate::core::{
    ApiGateway, AuditLogger, Config, DependentPickerCache, DynamicRecord, FetchOutcome,
    FormWorkflowController, HttpGateway, NoticeLevel, PagedCollectionStore, PermissionGate,
    RecordId, ResourceScreen, SubmitOutcome, Workspace,
};
use crate::resources::{Catalog, PickerSpec, ResourceDescriptor};

/// Run a future to completion on a single-threaded runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    Ok(runtime.block_on(future))
}

/// Locate the workspace: `--workspace` wins, otherwise walk up from the
/// current directory (running outside a workspace is allowed)
pub fn find_workspace(global: &GlobalOpts) -> Result<Option<Workspace>> {
    match &global.workspace {
        Some(path) => Workspace::discover_from(path)
            .map(Some)
            .map_err(|e| miette::miette!("{}", e)),
        None => Ok(Workspace::discover().ok()),
    }
}

/// Workspace catalog if present, otherwise the built-in one
pub fn load_catalog(workspace: Option<&Workspace>) -> Result<Catalog> {
    match workspace {
        Some(ws) if ws.catalog_path().exists() => Ok(Catalog::load(&ws.catalog_path())?),
        _ => Ok(Catalog::builtin()?),
    }
}

/// Everything a remote command needs: configuration, catalog and gateway
pub struct Session {
    pub config: Config,
    pub catalog: Catalog,
    gateway: Rc<dyn ApiGateway>,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = find_workspace(global)?;
        let config = Config::load_for(workspace.as_ref());
        let catalog = load_catalog(workspace.as_ref())?;

        let api_url = global
            .api_url
            .clone()
            .or_else(|| config.api_url.clone())
            .ok_or_else(|| {
                miette::miette!(
                    help = "Set MDESK_API_URL, pass --api-url, or run 'mdesk config set api_url <url>'",
                    "No API URL configured"
                )
            })?;
        let gateway = HttpGateway::new(&api_url, config.token.clone(), config.timeout())
            .map_err(|e| miette::miette!("{}", e))?;

        Ok(Self::with_gateway(config, catalog, Rc::new(gateway)))
    }

    pub fn with_gateway(config: Config, catalog: Catalog, gateway: Rc<dyn ApiGateway>) -> Self {
        Self {
            config,
            catalog,
            gateway,
        }
    }

    pub fn descriptor(&self, key: &str) -> Result<&ResourceDescriptor> {
        Ok(self.catalog.get(key)?)
    }

    /// Wire store, controller, pickers and permission gate for one resource
    pub fn screen(&self, descriptor: &ResourceDescriptor) -> Result<ResourceScreen<DynamicRecord>> {
        let store = Rc::new(
            PagedCollectionStore::new(Rc::clone(&self.gateway), &descriptor.path)
                .with_id_field(&descriptor.id_field)
                .with_rows_per_page(self.config.rows_per_page())
                .with_filters(descriptor.filter_state()),
        );
        let audit = AuditLogger::new(Rc::clone(&self.gateway), &self.config.username())
            .with_origin(&self.config.origin());
        let controller = FormWorkflowController::new(
            Rc::clone(&self.gateway),
            Rc::clone(&store),
            Rc::new(descriptor.schema()),
            audit,
            &descriptor.label,
        );
        let gate = Rc::new(self.gate());

        let mut screen = ResourceScreen::new(descriptor.scope(), gate, store, controller);
        for spec in &descriptor.pickers {
            screen = screen.with_picker(&spec.field, self.picker(spec)?);
        }
        Ok(screen)
    }

    /// Permission gate over the session's gateway
    pub fn gate(&self) -> PermissionGate {
        PermissionGate::new(Rc::clone(&self.gateway))
    }

    /// Option source for a reference field
    pub fn picker(&self, spec: &PickerSpec) -> Result<DependentPickerCache> {
        let foreign = self.descriptor(&spec.resource)?;
        let picker = DependentPickerCache::new(Rc::clone(&self.gateway), &foreign.path, &spec.label_field)
            .with_id_field(&foreign.id_field);
        Ok(match &spec.parent {
            Some(parent) => picker.with_parent(parent),
            None => picker,
        })
    }
}

/// Turn a failed or dropped fetch into an error
pub fn expect_loaded(outcome: FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Loaded(_) | FetchOutcome::Empty => Ok(()),
        FetchOutcome::Failed(message) => Err(miette::miette!("{}", message)),
        FetchOutcome::Stale => Err(miette::miette!("Request was superseded")),
    }
}

/// Select `id`, paging forward through the table until it is found
pub async fn locate(screen: &ResourceScreen<DynamicRecord>, id: &RecordId) -> Result<()> {
    loop {
        if screen.select_row(id) {
            return Ok(());
        }
        let pagination = screen.store().pagination();
        if !pagination.has_next() {
            return Err(miette::miette!("No record with id '{}'", id));
        }
        expect_loaded(screen.go_to_page(pagination.page + 1).await)?;
    }
}

/// Split `field=value`
pub fn parse_assignment(input: &str) -> Result<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| miette::miette!("Expected field=value, got '{}'", input))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(miette::miette!("Missing field name in '{}'", input));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Feed `field=value` pairs into the open form
pub fn apply_assignments(screen: &ResourceScreen<DynamicRecord>, assignments: &[String]) -> Result<()> {
    for raw in assignments {
        let (field, value) = parse_assignment(raw)?;
        screen
            .set_field_input(&field, &value)
            .map_err(|e| miette::miette!("{}: {}", field, e))?;
    }
    Ok(())
}

/// Print queued notices of the screen's controller
pub fn print_notices(screen: &ResourceScreen<DynamicRecord>, quiet: bool) {
    for notice in screen.controller().take_notices() {
        match notice.level {
            NoticeLevel::Success if !quiet => {
                println!("{} {}", style("✓").green(), notice.message)
            }
            NoticeLevel::Info if !quiet => println!("{}", style(&notice.message).dim()),
            NoticeLevel::Warning => eprintln!("{} {}", style("!").yellow(), notice.message),
            NoticeLevel::Error => eprintln!("{} {}", style("✗").red(), notice.message),
            _ => {}
        }
    }
}

/// Report a submission result; anything but success is an error
pub fn finish_submit(screen: &ResourceScreen<DynamicRecord>, outcome: SubmitOutcome, quiet: bool) -> Result<()> {
    match outcome {
        SubmitOutcome::Completed { success: true, .. } => {
            print_notices(screen, quiet);
            Ok(())
        }
        SubmitOutcome::Completed { message, .. } => {
            screen.controller().take_notices();
            Err(miette::miette!("{}", message))
        }
        SubmitOutcome::Invalid(errors) => {
            for (field, error) in &errors {
                eprintln!("  {} {}: {}", style("✗").red(), style(field).cyan(), error);
            }
            Err(miette::miette!("{} field(s) failed validation", errors.len()))
        }
        SubmitOutcome::Ignored => {
            print_notices(screen, quiet);
            Err(miette::miette!("Nothing was submitted"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("code = KG").unwrap(),
            ("code".to_string(), "KG".to_string())
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
