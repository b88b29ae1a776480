//! `mdesk resources` command - inspect the resource catalog

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::utils::{find_workspace, load_catalog};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::form::Validator;
use crate::resources::{Catalog, ResourceDescriptor};

#[derive(clap::Args, Debug)]
pub struct ResourcesArgs {
    /// Show the fields, filters and pickers of one resource
    pub key: Option<String>,
}

pub fn run(args: ResourcesArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = find_workspace(global)?;
    let catalog = load_catalog(workspace.as_ref())?;

    match args.key {
        Some(key) => show_resource(catalog.get(&key)?, global),
        None => list_resources(&catalog, global),
    }
}

fn list_resources(catalog: &Catalog, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&catalog.resources).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&catalog.resources).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for key in catalog.keys() {
                println!("{}", key);
            }
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(["KEY", "LABEL", "PATH", "FIELDS", "FILTERS"]);
            for r in &catalog.resources {
                let filters: Vec<&str> = r.filters.iter().map(|f| f.key.as_str()).collect();
                builder.push_record([
                    r.key.clone(),
                    r.label.clone(),
                    r.path.clone(),
                    r.fields.len().to_string(),
                    filters.join(", "),
                ]);
            }
            let mut table = builder.build();
            if global.format == OutputFormat::Md {
                table.with(Style::markdown());
            } else {
                table.with(Style::sharp());
            }
            println!("{}", table);
            if !global.quiet {
                println!();
                println!(
                    "{} resource(s). Use {} for details.",
                    catalog.resources.len(),
                    style_cmd("mdesk resources <key>")
                );
            }
        }
    }
    Ok(())
}

fn show_resource(resource: &ResourceDescriptor, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(resource).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(resource).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    println!("{} {}", style(&resource.label).bold(), style(format!("({})", resource.key)).dim());
    println!("  {} /{}", style("endpoint:").dim(), resource.path);
    println!("  {} {}", style("permission route:").dim(), resource.route);
    println!("  {} {}", style("code field:").dim(), resource.code_field);
    println!();

    let mut builder = Builder::default();
    builder.push_record(["FIELD", "LABEL", "KIND", "REQUIRED", "RULES"]);
    for field in &resource.fields {
        let mut kind = field.kind.to_string();
        if let Some(target) = &field.references {
            kind = format!("{} → {}", kind, target);
        }
        let rules: Vec<String> = field.validators.iter().map(describe_rule).collect();
        builder.push_record([
            field.name.clone(),
            field.label.clone(),
            kind,
            if field.required { "yes" } else { "" }.to_string(),
            rules.join(", "),
        ]);
    }
    println!("{}", builder.build().with(Style::sharp()));

    if !resource.filters.is_empty() {
        println!();
        println!("{}", style("Filters").bold());
        for filter in &resource.filters {
            match &filter.parent {
                Some(parent) => println!("  {} (cleared when {} changes)", style(&filter.key).cyan(), parent),
                None => println!("  {}", style(&filter.key).cyan()),
            }
        }
    }

    if !resource.pickers.is_empty() {
        println!();
        println!("{}", style("Pickers").bold());
        for picker in &resource.pickers {
            let scope = picker
                .parent
                .as_ref()
                .map(|p| format!(", scoped by {}", p))
                .unwrap_or_default();
            println!(
                "  {} ← {}{}",
                style(&picker.field).cyan(),
                picker.resource,
                scope
            );
        }
    }
    Ok(())
}

fn describe_rule(rule: &Validator) -> String {
    match rule {
        Validator::MinLength { min } => format!("min {} chars", min),
        Validator::MaxLength { max } => format!("max {} chars", max),
        Validator::Range { min, max } => match (min, max) {
            (Some(lo), Some(hi)) => format!("{}..{}", lo, hi),
            (Some(lo), None) => format!(">= {}", lo),
            (None, Some(hi)) => format!("<= {}", hi),
            (None, None) => "number".to_string(),
        },
        Validator::OneOf { values } => format!("one of {}", values.join("|")),
    }
}

fn style_cmd(cmd: &str) -> String {
    style(cmd).yellow().to_string()
}
