//! `mdesk add` command - create a record

use console::Term;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{apply_assignments, block_on, expect_loaded, finish_submit, Session};
use crate::cli::GlobalOpts;
use crate::core::{Action, DynamicRecord, ResourceScreen};

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,

    /// Field value, repeatable (e.g. --set code=KG). Without any, fields are prompted for.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub values: Vec<String>,
}

pub fn run(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let screen = session.screen(descriptor)?;

    block_on(async {
        expect_loaded(screen.mount().await)?;
        if !screen.begin(Action::Create) {
            return Err(miette::miette!("You are not allowed to add {}", descriptor.label));
        }
        if args.values.is_empty() && Term::stdout().is_term() {
            prompt_fields(&screen)?;
        } else {
            apply_assignments(&screen, &args.values)?;
        }
        let outcome = screen.submit().await;
        finish_submit(&screen, outcome, global.quiet)
    })?
}

/// Ask for every field of the open form, re-asking on parse errors
pub(crate) fn prompt_fields(screen: &ResourceScreen<DynamicRecord>) -> Result<()> {
    let theme = ColorfulTheme::default();
    let fields = screen.controller().schema().fields().to_vec();
    for field in fields {
        let current = screen.controller().form().values.text(&field.name).unwrap_or_default();
        loop {
            let prompt = if field.required {
                format!("{} *", field.label)
            } else {
                field.label.clone()
            };
            let input: String = Input::with_theme(&theme)
                .with_prompt(prompt)
                .with_initial_text(current.clone())
                .allow_empty(true)
                .interact_text()
                .into_diagnostic()?;
            match screen.set_field_input(&field.name, &input) {
                Ok(()) => break,
                Err(e) => eprintln!("  {}", e),
            }
        }
    }
    Ok(())
}
