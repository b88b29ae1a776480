//! `mdesk options` command - browse the options of a reference field

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{block_on, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{DependentPickerCache, PickerOutcome};

#[derive(clap::Args, Debug)]
pub struct OptionsArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,

    /// Reference field whose options to list
    pub field: String,

    /// Value of the field this one depends on (e.g. the building id)
    #[arg(long)]
    pub parent: Option<String>,

    /// Search text
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

pub fn run(args: OptionsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let spec = descriptor.picker(&args.field).ok_or_else(|| {
        miette::miette!(
            "'{}' has no picker for field '{}'",
            descriptor.key,
            args.field
        )
    })?;
    let picker = session.picker(spec)?;

    if let Some(parent) = picker.parent_key() {
        match &args.parent {
            Some(value) => {
                picker.set_parent(Some(value));
            }
            None => {
                return Err(miette::miette!(
                    help = format!("pass --parent <{}>", parent),
                    "'{}' depends on '{}'",
                    args.field,
                    parent
                ))
            }
        }
    }

    block_on(load_pages(&picker, &args.search, args.pages.max(1)))??;
    let options = picker.options();

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&options).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&options).into_diagnostic()?),
        OutputFormat::Id => {
            for option in &options {
                println!("{}", option.id);
            }
        }
        _ => {
            for option in &options {
                println!("{}\t{}", style(&option.id).cyan(), option.label);
            }
            if !global.quiet {
                let more = if picker.has_more() { ", more available" } else { "" };
                println!();
                println!("{} option(s){}", style(options.len()).cyan(), more);
            }
        }
    }
    Ok(())
}

async fn load_pages(picker: &DependentPickerCache, search: &str, pages: u32) -> Result<()> {
    check(picker.search(search).await)?;
    for _ in 1..pages {
        if !picker.has_more() {
            break;
        }
        check(picker.load_more().await)?;
    }
    Ok(())
}

fn check(outcome: PickerOutcome) -> Result<()> {
    match outcome {
        PickerOutcome::Failed(message) => Err(miette::miette!("{}", message)),
        _ => Ok(()),
    }
}
