//! `mdesk show` command - display one record

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{block_on, expect_loaded, locate, print_notices, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Action, RecordId};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,

    /// Record id
    pub id: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let screen = session.screen(descriptor)?;
    let id = RecordId::new(args.id.as_str());

    block_on(async {
        expect_loaded(screen.mount().await)?;
        locate(&screen, &id).await
    })??;

    let Some(record) = screen.controller().selection() else {
        return Err(miette::miette!("No record with id '{}'", id));
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record.fields()).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml | OutputFormat::Auto => {
            print!("{}", serde_yml::to_string(record.fields()).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Id => {
            println!("{}", id);
            return Ok(());
        }
        _ => {}
    }

    if !screen.begin(Action::View) {
        print_notices(&screen, global.quiet);
        return Err(miette::miette!("You are not allowed to view {}", descriptor.label));
    }
    let form = screen.controller().form();
    println!("{}", style(&form.title).bold());
    let width = screen
        .controller()
        .schema()
        .fields()
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0);
    for field in screen.controller().schema().fields() {
        let value = form.values.text(&field.name).unwrap_or_else(|| "-".to_string());
        println!("  {:<width$}  {}", style(&field.label).cyan(), value, width = width);
    }
    screen.controller().cancel();
    Ok(())
}
